use crate::identity::IdentityMaps;
use crate::rounds::{classify_round, BracketSide, RoundKey};
use crate::types::{GameNode, GameSlotNode, GameState, Record, SlotScore};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

// ── Bracket view types ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketSlot {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub slot_idx: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub score: Option<SlotScore>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub slot_state: Option<String>,
  #[serde(rename = "playerID", skip_serializing_if = "Option::is_none")]
  pub player_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub player_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub seed: Option<u32>,
  #[serde(rename = "prevGameID", skip_serializing_if = "Option::is_none")]
  pub prev_game_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketGame {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub round: Option<i64>,
  #[serde(rename = "bracketID", skip_serializing_if = "Option::is_none")]
  pub bracket_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub state: Option<GameState>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub score_to_win: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_time: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub scheduled_time: Option<i64>,
  pub slots: Vec<BracketSlot>,
  #[serde(rename = "nextGameSlotIDs", skip_serializing_if = "Vec::is_empty")]
  pub next_game_slot_ids: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub winner_placement: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub loser_placement: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub winner_slot_idx: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketRound {
  pub round: u64,
  pub round_name: String,
  pub bracket_type: BracketSide,
  pub games: Vec<BracketGame>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRound {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub winners_round: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub losers_round: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Champion {
  #[serde(rename = "playerID")]
  pub player_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(rename = "gameID", skip_serializing_if = "Option::is_none")]
  pub game_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub game_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketSummary {
  pub rounds: Vec<BracketRound>,
  pub total_games: usize,
  pub completed_games: usize,
  pub active_games: usize,
  pub current_round: CurrentRound,
  pub champions: Vec<Champion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundFilter {
  Winners,
  Losers,
  All,
}

impl RoundFilter {
  pub fn parse(raw: &str) -> Option<Self> {
    match raw.trim().to_ascii_lowercase().as_str() {
      "winners" => Some(RoundFilter::Winners),
      "losers" => Some(RoundFilter::Losers),
      "all" | "" => Some(RoundFilter::All),
      _ => None,
    }
  }

  fn accepts(self, side: BracketSide) -> bool {
    match self {
      RoundFilter::All => true,
      RoundFilter::Winners => matches!(side, BracketSide::Winners | BracketSide::Main),
      RoundFilter::Losers => side == BracketSide::Losers,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
  pub round: i64,
  pub round_name: String,
  pub bracket_type: BracketSide,
  pub games: Vec<BracketGame>,
  pub game_count: usize,
  pub completed_count: usize,
  pub active_count: usize,
}

// ── Game projection ────────────────────────────────────────────────────

fn bracket_slot(slot: &GameSlotNode, identity: &IdentityMaps) -> BracketSlot {
  let player = identity.player(slot.player_id.as_deref());
  BracketSlot {
    slot_idx: slot.slot_idx,
    score: slot.score,
    slot_state: slot.slot_state.clone(),
    player_id: slot.player_id.clone(),
    player_name: player.and_then(|p| p.name.clone()),
    display_name: player.and_then(|p| p.display_name.clone()),
    seed: player.and_then(|p| p.seed),
    prev_game_id: slot.prev_game_id.clone(),
  }
}

pub fn bracket_game(game: &GameNode, identity: &IdentityMaps) -> BracketGame {
  BracketGame {
    id: game.id.clone(),
    name: game.name.clone(),
    round: game.round,
    bracket_id: game.bracket_id.clone(),
    state: game.state,
    score_to_win: game.score_to_win,
    end_time: game.end_time,
    scheduled_time: game.scheduled_time,
    slots: game.slots.iter().map(|slot| bracket_slot(slot, identity)).collect(),
    next_game_slot_ids: game.next_game_slot_ids.clone(),
    winner_placement: game.winner_placement,
    loser_placement: game.loser_placement,
    winner_slot_idx: game.winner_slot_idx(),
  }
}

fn sort_by_name(games: &mut [BracketGame]) {
  games.sort_by(|a, b| {
    a.name
      .as_deref()
      .unwrap_or("")
      .cmp(b.name.as_deref().unwrap_or(""))
  });
}

// ── Assembly ───────────────────────────────────────────────────────────

/// Groups games by bracket side and unsigned round. Winners (or main) rounds
/// come first, each side ascending; games inside a round are ordered by name
/// with input order kept for equal names.
pub fn assemble_rounds(games: &[Record<GameNode>], format: Option<&str>, identity: &IdentityMaps) -> Vec<BracketRound> {
  let mut grouped: BTreeMap<RoundKey, Vec<BracketGame>> = BTreeMap::new();
  for game in games {
    let Some(round) = game.round else {
      warn!(game_id = ?game.id, "game has no round number; left out of bracket rounds");
      continue;
    };
    let key = classify_round(round, format);
    grouped.entry(key).or_default().push(bracket_game(game, identity));
  }
  grouped
    .into_iter()
    .map(|(key, mut games)| {
      sort_by_name(&mut games);
      BracketRound {
        round: key.number,
        round_name: key.name(),
        bracket_type: key.side,
        games,
      }
    })
    .collect()
}

pub fn count_completed(games: &[Record<GameNode>]) -> usize {
  games.iter().filter(|game| game.is_done()).count()
}

pub fn count_active(games: &[Record<GameNode>]) -> usize {
  games.iter().filter(|game| game.is_in_play()).count()
}

/// Highest round per side that still has an unfinished game.
pub fn current_round(games: &[Record<GameNode>], format: Option<&str>) -> CurrentRound {
  let mut current = CurrentRound::default();
  for game in games.iter().filter(|game| !game.is_done()) {
    let Some(round) = game.round.filter(|round| *round != 0) else {
      continue;
    };
    let key = classify_round(round, format);
    let slot = match key.side {
      BracketSide::Losers => &mut current.losers_round,
      BracketSide::Winners | BracketSide::Main => &mut current.winners_round,
    };
    *slot = Some(slot.map_or(key.number, |best| best.max(key.number)));
  }
  current
}

/// Every finished game that awards first place and has a strict winner.
pub fn champions(games: &[Record<GameNode>], identity: &IdentityMaps) -> Vec<Champion> {
  games
    .iter()
    .filter(|game| game.winner_placement == Some(1) && game.is_done())
    .filter_map(|game| {
      let winner = game.slots.get(game.winner_slot_idx()?)?;
      let player_id = winner.player_id.clone()?;
      let player = identity.player(Some(&player_id));
      Some(Champion {
        display_name: player.and_then(|p| p.display_name.clone()),
        name: player.and_then(|p| p.name.clone()),
        player_id,
        game_id: game.id.clone(),
        game_name: game.name.clone(),
      })
    })
    .collect()
}

pub fn assemble_bracket(games: &[Record<GameNode>], format: Option<&str>, identity: &IdentityMaps) -> BracketSummary {
  BracketSummary {
    rounds: assemble_rounds(games, format, identity),
    total_games: games.len(),
    completed_games: count_completed(games),
    active_games: count_active(games),
    current_round: current_round(games, format),
    champions: champions(games, identity),
  }
}

/// Games of one unsigned round, optionally restricted to a side.
pub fn round_view(
  games: &[Record<GameNode>],
  format: Option<&str>,
  identity: &IdentityMaps,
  round: i64,
  filter: RoundFilter,
) -> RoundView {
  let requested = classify_round(round, format);
  let selected: Vec<&Record<GameNode>> = games
    .iter()
    .filter(|game| {
      game.round.map_or(false, |r| {
        let key = classify_round(r, format);
        key.number == requested.number && filter.accepts(key.side)
      })
    })
    .collect();
  let mut view_games: Vec<BracketGame> = selected.iter().map(|game| bracket_game(game, identity)).collect();
  sort_by_name(&mut view_games);
  RoundView {
    round,
    round_name: requested.name(),
    bracket_type: requested.side,
    game_count: view_games.len(),
    completed_count: selected.iter().filter(|game| game.is_done()).count(),
    active_count: selected.iter().filter(|game| game.is_in_play()).count(),
    games: view_games,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::PlayerNode;
  use serde_json::json;

  fn make_game(raw: serde_json::Value) -> Record<GameNode> {
    Record::from_value(raw).unwrap()
  }

  fn make_identity() -> IdentityMaps {
    let players: Vec<Record<PlayerNode>> = serde_json::from_value(json!([
      { "id": "p1", "name": "Hypershock Team", "seed": 1, "profileInfo": { "tag": "Hypershock" } },
      { "id": "p2", "name": "Lynx", "seed": 2 },
    ]))
    .unwrap();
    IdentityMaps::build(&players, &[])
  }

  fn make_double_elim_games() -> Vec<Record<GameNode>> {
    vec![
      make_game(json!({ "id": "g4", "name": "L1-B", "round": -1, "state": "done" })),
      make_game(json!({ "id": "g1", "name": "W1-B", "round": 1, "state": "done" })),
      make_game(json!({ "id": "g2", "name": "W1-A", "round": 1, "state": "active" })),
      make_game(json!({ "id": "g3", "name": "W2-A", "round": 2, "state": "available" })),
      make_game(json!({ "id": "g5", "name": "L1-A", "round": -1, "state": "called" })),
      make_game(json!({ "id": "g6", "name": "L2-A", "round": -2, "state": "unavailable" })),
    ]
  }

  #[test]
  fn test_rounds_ordered_winners_then_losers() {
    let rounds = assemble_rounds(&make_double_elim_games(), Some("double_elimination"), &make_identity());
    let order: Vec<(BracketSide, u64)> = rounds.iter().map(|r| (r.bracket_type, r.round)).collect();
    assert_eq!(
      order,
      vec![
        (BracketSide::Winners, 1),
        (BracketSide::Winners, 2),
        (BracketSide::Losers, 1),
        (BracketSide::Losers, 2),
      ]
    );
    let names: Vec<&str> = rounds[0].games.iter().filter_map(|g| g.name.as_deref()).collect();
    assert_eq!(names, vec!["W1-A", "W1-B"]);
    assert_eq!(rounds[2].round_name, "Losers Round 1");
    assert_eq!(rounds[1].round_name, "Semifinals");
  }

  #[test]
  fn test_equal_names_keep_input_order() {
    let games = vec![
      make_game(json!({ "id": "first", "name": "A", "round": 1 })),
      make_game(json!({ "id": "second", "name": "A", "round": 1 })),
      make_game(json!({ "id": "third", "round": 1 })),
    ];
    let rounds = assemble_rounds(&games, None, &IdentityMaps::default());
    let ids: Vec<&str> = rounds[0].games.iter().filter_map(|g| g.id.as_deref()).collect();
    assert_eq!(ids, vec!["third", "first", "second"]);
    assert_eq!(rounds[0].bracket_type, BracketSide::Main);
  }

  #[test]
  fn test_counters_and_current_round() {
    let games = make_double_elim_games();
    assert_eq!(count_completed(&games), 2);
    assert_eq!(count_active(&games), 2);
    let current = current_round(&games, Some("double_elimination"));
    assert_eq!(current.winners_round, Some(2));
    assert_eq!(current.losers_round, Some(2));
  }

  #[test]
  fn test_current_round_ignores_finished_games() {
    let games = vec![
      make_game(json!({ "round": 3, "state": "done" })),
      make_game(json!({ "round": 2, "state": "hold" })),
    ];
    let current = current_round(&games, Some("double_elimination"));
    assert_eq!(current.winners_round, Some(2));
    assert_eq!(current.losers_round, None);
  }

  #[test]
  fn test_champion_detection() {
    let identity = make_identity();
    let game = make_game(json!({
      "id": "gf", "name": "GF", "round": 1, "state": "done", "winnerPlacement": 1,
      "slots": [{ "slotIdx": 0, "playerID": "p1", "score": 3 }, { "slotIdx": 1, "playerID": "p2", "score": 1 }],
    }));
    let found = champions(std::slice::from_ref(&game), &identity);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].player_id, "p1");
    assert_eq!(found[0].display_name.as_deref(), Some("Hypershock"));
    assert_eq!(found[0].game_name.as_deref(), Some("GF"));

    let tied = make_game(json!({
      "id": "gf", "name": "GF", "round": 1, "state": "done", "winnerPlacement": 1,
      "slots": [{ "slotIdx": 0, "playerID": "p1", "score": 3 }, { "slotIdx": 1, "playerID": "p2", "score": 3 }],
    }));
    assert!(champions(std::slice::from_ref(&tied), &identity).is_empty());
  }

  #[test]
  fn test_champion_requires_first_place_and_done() {
    let identity = make_identity();
    let slots = json!([{ "playerID": "p1", "score": 2 }, { "playerID": "p2", "score": 0 }]);
    let games = vec![
      make_game(json!({ "state": "done", "winnerPlacement": 2, "slots": slots })),
      make_game(json!({ "state": "active", "winnerPlacement": 1, "slots": slots })),
      make_game(json!({ "state": "done", "winnerPlacement": 1, "slots": [{ "playerID": "p1", "score": -1 }, { "playerID": "p2", "score": 0 }] })),
      make_game(json!({ "id": "ok", "state": "done", "winnerPlacement": 1, "slots": [{ "playerID": "p1", "score": 0 }, { "playerID": "p2", "score": 2 }] })),
    ];
    let found = champions(&games, &identity);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].player_id, "p2");
    assert_eq!(found[0].game_id.as_deref(), Some("ok"));
  }

  #[test]
  fn test_bracket_game_carries_identity_and_winner() {
    let game = make_game(json!({
      "id": "g1", "name": "W1-A", "round": 1, "state": "done", "bracketID": "b1",
      "slots": [{ "slotIdx": 0, "playerID": "p1", "score": 1 }, { "slotIdx": 1, "playerID": "p2", "score": 2 }],
    }));
    let projected = bracket_game(&game, &make_identity());
    assert_eq!(projected.winner_slot_idx, Some(1));
    assert_eq!(projected.slots[0].display_name.as_deref(), Some("Hypershock"));
    assert_eq!(projected.slots[0].player_name.as_deref(), Some("Hypershock Team"));
    assert_eq!(projected.slots[1].seed, Some(2));
    let out = serde_json::to_value(&projected).unwrap();
    assert_eq!(out["bracketID"], json!("b1"));
    assert_eq!(out["slots"][0]["playerID"], json!("p1"));
  }

  #[test]
  fn test_malformed_games_do_not_abort_assembly() {
    let games = vec![
      make_game(json!({ "id": "g1", "name": "W1-A", "round": 1, "slots": "oops" })),
      make_game(json!({ "id": "g2", "name": "W1-B", "round": "?" })),
    ];
    let summary = assemble_bracket(&games, Some("double_elimination"), &IdentityMaps::default());
    assert_eq!(summary.total_games, 2);
    assert_eq!(summary.rounds.len(), 1);
    assert!(summary.rounds[0].games[0].slots.is_empty());
    assert!(summary.champions.is_empty());
  }

  #[test]
  fn test_round_view_filters() {
    let games = make_double_elim_games();
    let identity = make_identity();
    let all = round_view(&games, Some("double_elimination"), &identity, 1, RoundFilter::All);
    assert_eq!(all.game_count, 4);
    assert_eq!(all.completed_count, 2);
    assert_eq!(all.active_count, 2);
    assert_eq!(all.round_name, "Finals");

    let losers = round_view(&games, Some("double_elimination"), &identity, -1, RoundFilter::Losers);
    let names: Vec<&str> = losers.games.iter().filter_map(|g| g.name.as_deref()).collect();
    assert_eq!(names, vec!["L1-A", "L1-B"]);
    assert_eq!(losers.bracket_type, BracketSide::Losers);

    let winners = round_view(&games, Some("double_elimination"), &identity, 1, RoundFilter::Winners);
    assert_eq!(winners.game_count, 2);
    assert_eq!(RoundFilter::parse("LOSERS"), Some(RoundFilter::Losers));
    assert_eq!(RoundFilter::parse("sideways"), None);
  }
}

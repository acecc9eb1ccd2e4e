use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use crate::bracket::{assemble_bracket, round_view, BracketSummary, RoundFilter, RoundView};
use crate::error::{BracketError, BracketResult};
use crate::identity::{lookup_name, profile_tag, IdentityMaps, PlayerIdentity};
use crate::rounds::{
    all_qualification_rounds, qualification_round, round_info, QualificationRound, QUALIFICATION_EXPLANATION,
};
use crate::standings::{calculate_standings, StandingEntry};
use crate::stats::{detect_weight_class, Annotator, SlotAnnotation, StatsAnnotation, StatsProvider};
use crate::truefinals::TournamentSource;
use crate::types::*;

pub const ENRICHMENT_NOTE: &str =
    "Player names, display names, and location names are included throughout for better readability";
pub const STANDINGS_NOTE: &str =
    "Players are sorted by placement. Players without placement are sorted by record.";

// ── Enriched documents ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationFields {
    pub round_name: String,
    pub round_description: String,
    pub win_implication: String,
    pub lose_implication: String,
    pub is_qualification_round: bool,
}

impl From<QualificationRound> for QualificationFields {
    fn from(round: QualificationRound) -> Self {
        QualificationFields {
            round_name: round.name,
            round_description: round.description,
            win_implication: round.win_implication,
            lose_implication: round.lose_implication,
            is_qualification_round: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSlot {
    #[serde(flatten)]
    pub slot: Record<GameSlotNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub stats: SlotAnnotation,
}

/// A slot element as received. Elements that are not JSON objects are passed
/// through untouched.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SlotEntry {
    Enriched(EnrichedSlot),
    Unreadable(Value),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedGame {
    #[serde(flatten)]
    pub game: Record<GameNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<SlotEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(flatten)]
    pub qualification: Option<QualificationFields>,
}

impl EnrichedGame {
    pub fn enriched_slots(&self) -> impl Iterator<Item = &EnrichedSlot> {
        self.slots.iter().filter_map(|entry| match entry {
            SlotEntry::Enriched(slot) => Some(slot),
            SlotEntry::Unreadable(_) => None,
        })
    }

    /// Display labels of the seated participants, in slot order.
    pub fn player_names(&self) -> Vec<String> {
        self.enriched_slots()
            .filter_map(|slot| slot.display_name.clone().or_else(|| slot.player_name.clone()))
            .collect()
    }

    /// Folds each slot's names into a single `playerName` holding the
    /// display name, as the full tournament document presents them.
    fn with_display_player_names(mut self) -> Self {
        for entry in &mut self.slots {
            if let SlotEntry::Enriched(slot) = entry {
                if let Some(display_name) = slot.display_name.take() {
                    slot.player_name = Some(display_name);
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGameInfo {
    #[serde(rename = "gameID")]
    pub game_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
    pub player_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<GameState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_qualification_round: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedLocation {
    #[serde(flatten)]
    pub location: Record<LocationNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_game_info: Option<ActiveGameInfo>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPlayer {
    #[serde(flatten)]
    pub player: Record<PlayerNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitch_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub stats: StatsAnnotation,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentDocument {
    #[serde(flatten)]
    pub tournament: Record<TournamentNode>,
    pub players: Vec<EnrichedPlayer>,
    pub games: Vec<EnrichedGame>,
    pub locations: Vec<EnrichedLocation>,
    pub players_count: usize,
    pub games_count: usize,
    pub locations_count: usize,
    pub enrichment_note: &'static str,
    #[serde(rename = "detected_weight_class", skip_serializing_if = "Option::is_none")]
    pub detected_weight_class: Option<&'static str>,
    #[serde(rename = "nhrl_recent_champions", skip_serializing_if = "Option::is_none")]
    pub nhrl_recent_champions: Option<Vec<EventWinner>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayTips {
    pub rounds: &'static str,
    #[serde(rename = "gameStates")]
    pub game_states: &'static str,
    pub scores: &'static str,
    pub navigation: &'static str,
}

pub const DISPLAY_TIPS: DisplayTips = DisplayTips {
    rounds: "Games are organized by round and bracket type (winners/losers for double elimination)",
    game_states: "Game states: 'unavailable' = waiting for previous games, 'available' = ready to play, \
                  'called' = competitors called to the cage, 'active' = in progress, 'hold' = paused, 'done' = completed",
    scores: "Scores of -1 indicate a player hasn't competed yet or was eliminated",
    navigation: "Use round numbers to focus on specific rounds, negative rounds are losers bracket",
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketDocument {
    #[serde(rename = "tournamentID")]
    pub tournament_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tournament_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub status: &'static str,
    pub player_count: usize,
    #[serde(flatten)]
    pub summary: BracketSummary,
    pub standings: Vec<StandingEntry>,
    pub display_tips: DisplayTips,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundDocument {
    #[serde(rename = "tournamentID")]
    pub tournament_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tournament_name: Option<String>,
    #[serde(flatten)]
    pub view: RoundView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsView {
    #[serde(rename = "tournamentID")]
    pub tournament_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tournament_name: Option<String>,
    pub status: &'static str,
    pub standings: Vec<StandingEntry>,
    pub player_count: usize,
    pub note: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualificationSystemView {
    pub qualification_system: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_codes: Option<Vec<QualificationRound>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_round: Option<QualificationRound>,
}

// ── Pure builders ──────────────────────────────────────────────────────

fn stats_name(player: &PlayerIdentity) -> Option<String> {
    lookup_name(player.name.as_deref(), player.display_name.as_deref(), player.tag.as_deref())
}

/// Adds participant names, location name and qualification metadata to a
/// game. Slot statistics are looked up only when an annotator is given.
pub fn enrich_game(
    game: &Record<GameNode>,
    identity: &IdentityMaps,
    mut annotator: Option<&mut Annotator<'_>>,
) -> EnrichedGame {
    let raw_slots: &[Value] = match game.raw().get("slots") {
        Some(Value::Array(items)) => items,
        _ => &[],
    };
    let slots: Vec<SlotEntry> = raw_slots
        .iter()
        .enumerate()
        .map(|(idx, item)| match Record::<GameSlotNode>::from_value(item.clone()) {
            Ok(slot) => SlotEntry::Enriched(enrich_slot(slot, identity, annotator.as_deref_mut())),
            Err(err) => {
                warn!(game_id = ?game.id, index = idx, "slot left as received: {}", BracketError::MalformedRecord(err.to_string()));
                SlotEntry::Unreadable(item.clone())
            }
        })
        .collect();
    let base = if slots.is_empty() { game.clone() } else { game.without(&["slots"]) };
    EnrichedGame {
        location_name: identity.location_name(game.location_id.as_deref()).map(str::to_string),
        qualification: game.name.as_deref().and_then(qualification_round).map(QualificationFields::from),
        slots,
        game: base,
    }
}

fn enrich_slot(slot: Record<GameSlotNode>, identity: &IdentityMaps, annotator: Option<&mut Annotator<'_>>) -> EnrichedSlot {
    let player = identity.player(slot.player_id.as_deref());
    let stats = match (annotator, player) {
        (Some(annotator), Some(player)) => annotator.slot(stats_name(player).as_deref()),
        _ => SlotAnnotation::default(),
    };
    EnrichedSlot {
        player_name: player.and_then(|p| p.name.clone()),
        display_name: player.and_then(|p| p.display_name.clone()),
        stats,
        slot,
    }
}

pub fn active_game_info(game: &EnrichedGame) -> Option<ActiveGameInfo> {
    let game_id = game.game.id.clone()?;
    let qualification = game.qualification.as_ref();
    Some(ActiveGameInfo {
        game_id,
        game_name: game.game.name.clone(),
        player_names: game.player_names(),
        state: game.game.state,
        round_name: qualification.map(|q| q.round_name.clone()),
        is_qualification_round: qualification.map(|_| true),
    })
}

pub fn enrich_location(location: &Record<LocationNode>, active_game: Option<&EnrichedGame>) -> EnrichedLocation {
    EnrichedLocation {
        location: location.clone(),
        active_game_info: active_game.and_then(active_game_info),
    }
}

fn profile_field(player: &PlayerNode, pick: impl Fn(&ProfileInfoNode) -> Option<&String>) -> Option<String> {
    player
        .profile_info
        .as_ref()
        .and_then(|profile| pick(profile))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn enrich_player(player: &Record<PlayerNode>, annotator: &mut Annotator<'_>) -> EnrichedPlayer {
    let identity = PlayerIdentity::from_node(player);
    let stats = annotator.participant(stats_name(&identity).as_deref());
    EnrichedPlayer {
        player: player.clone(),
        tag: profile_tag(player),
        pronouns: profile_field(player, |p| p.pronouns.as_ref()),
        twitch_handle: profile_field(player, |p| p.twitch_handle.as_ref()),
        twitter_handle: profile_field(player, |p| p.twitter_handle.as_ref()),
        display_name: identity.display_name,
        stats,
    }
}

fn find_game<'g>(games: &'g [EnrichedGame], game_id: Option<&str>) -> Option<&'g EnrichedGame> {
    let game_id = game_id?;
    games.iter().find(|game| game.game.id.as_deref() == Some(game_id))
}

pub fn build_tournament_document(tournament: &Record<TournamentNode>, annotator: &mut Annotator<'_>) -> TournamentDocument {
    let identity = IdentityMaps::build(&tournament.players, &tournament.locations);
    let players: Vec<EnrichedPlayer> = tournament
        .players
        .iter()
        .map(|player| enrich_player(player, annotator))
        .collect();
    let games: Vec<EnrichedGame> = tournament
        .games
        .iter()
        .map(|game| enrich_game(game, &identity, None).with_display_player_names())
        .collect();
    let locations: Vec<EnrichedLocation> = tournament
        .locations
        .iter()
        .map(|location| enrich_location(location, find_game(&games, location.active_game_id.as_deref())))
        .collect();
    let detected_weight_class = tournament.title.as_deref().and_then(detect_weight_class);
    let nhrl_recent_champions = detected_weight_class
        .map(|weight_class| annotator.recent_champions(weight_class))
        .filter(|winners| !winners.is_empty());

    TournamentDocument {
        tournament: tournament.without(&["players", "games", "locations"]),
        players_count: players.len(),
        games_count: games.len(),
        locations_count: locations.len(),
        players,
        games,
        locations,
        enrichment_note: ENRICHMENT_NOTE,
        detected_weight_class,
        nhrl_recent_champions,
    }
}

pub fn build_bracket_document(tournament_id: &str, tournament: &TournamentNode) -> BracketDocument {
    let identity = IdentityMaps::build(&tournament.players, &[]);
    let format = tournament.format_type();
    BracketDocument {
        tournament_id: tournament_id.to_string(),
        tournament_name: tournament.title.clone(),
        format: format.map(str::to_string),
        status: tournament.status(),
        player_count: identity.players.len(),
        summary: assemble_bracket(&tournament.games, format, &identity),
        standings: calculate_standings(&tournament.players),
        display_tips: DISPLAY_TIPS,
    }
}

pub fn build_round_document(
    tournament_id: &str,
    tournament: &TournamentNode,
    round: i64,
    filter: RoundFilter,
) -> RoundDocument {
    let identity = IdentityMaps::build(&tournament.players, &[]);
    RoundDocument {
        tournament_id: tournament_id.to_string(),
        tournament_name: tournament.title.clone(),
        view: round_view(&tournament.games, tournament.format_type(), &identity, round, filter),
    }
}

pub fn build_standings_view(tournament_id: &str, tournament: &TournamentNode) -> StandingsView {
    let standings = calculate_standings(&tournament.players);
    StandingsView {
        tournament_id: tournament_id.to_string(),
        tournament_name: tournament.title.clone(),
        status: tournament.status(),
        player_count: standings.len(),
        standings,
        note: STANDINGS_NOTE,
    }
}

pub fn qualification_system(round_code: Option<&str>) -> QualificationSystemView {
    match round_code.map(str::trim).filter(|code| !code.is_empty()) {
        Some(code) => QualificationSystemView {
            qualification_system: QUALIFICATION_EXPLANATION,
            round_codes: None,
            specific_round: Some(round_info(code)),
        },
        None => QualificationSystemView {
            qualification_system: QUALIFICATION_EXPLANATION,
            round_codes: Some(all_qualification_rounds()),
            specific_round: None,
        },
    }
}

// ── Fetching facade ────────────────────────────────────────────────────

/// Fetches snapshots from the tournament source and builds enriched views.
/// Only the primary record of each call can fail the request.
pub struct Enricher<'a> {
    source: &'a dyn TournamentSource,
    stats: &'a dyn StatsProvider,
}

impl<'a> Enricher<'a> {
    pub fn new(source: &'a dyn TournamentSource, stats: &'a dyn StatsProvider) -> Self {
        Enricher { source, stats }
    }

    fn secondary_players(&self, tournament_id: &str) -> Vec<Record<PlayerNode>> {
        self.source.players(tournament_id).unwrap_or_else(|err| {
            warn!(tournament_id, "players unavailable, names omitted: {err}");
            Vec::new()
        })
    }

    fn secondary_locations(&self, tournament_id: &str) -> Vec<Record<LocationNode>> {
        self.source.locations(tournament_id).unwrap_or_else(|err| {
            warn!(tournament_id, "locations unavailable, location names omitted: {err}");
            Vec::new()
        })
    }

    fn identity(&self, tournament_id: &str) -> IdentityMaps {
        IdentityMaps::build(&self.secondary_players(tournament_id), &self.secondary_locations(tournament_id))
    }

    pub fn game(&self, tournament_id: &str, game_id: &str) -> BracketResult<EnrichedGame> {
        let game = self.source.game(tournament_id, game_id)?;
        let identity = self.identity(tournament_id);
        let mut annotator = Annotator::new(self.stats);
        Ok(enrich_game(&game, &identity, Some(&mut annotator)))
    }

    pub fn games(&self, tournament_id: &str) -> BracketResult<Vec<EnrichedGame>> {
        let games = self.source.games(tournament_id)?;
        let identity = self.identity(tournament_id);
        let mut annotator = Annotator::new(self.stats);
        let enriched = games
            .iter()
            .map(|game| enrich_game(game, &identity, Some(&mut annotator)))
            .collect::<Vec<_>>();
        info!(tournament_id, games = enriched.len(), "enriched games");
        Ok(enriched)
    }

    pub fn location(&self, tournament_id: &str, location_id: &str) -> BracketResult<EnrichedLocation> {
        let location = self.source.location(tournament_id, location_id)?;
        let active = match location.active_game_id.as_deref() {
            Some(game_id) => match self.source.game(tournament_id, game_id) {
                Ok(game) => {
                    let identity = IdentityMaps::build(&self.secondary_players(tournament_id), &[]);
                    Some(enrich_game(&game, &identity, None))
                }
                Err(err) => {
                    warn!(tournament_id, game_id, "active game unavailable: {err}");
                    None
                }
            },
            None => None,
        };
        Ok(enrich_location(&location, active.as_ref()))
    }

    pub fn locations(&self, tournament_id: &str) -> BracketResult<Vec<EnrichedLocation>> {
        let locations = self.source.locations(tournament_id)?;
        let games = if locations.iter().any(|location| location.active_game_id.is_some()) {
            let identity = IdentityMaps::build(&self.secondary_players(tournament_id), &locations);
            self.source
                .games(tournament_id)
                .map(|games| games.iter().map(|game| enrich_game(game, &identity, None)).collect())
                .unwrap_or_else(|err| {
                    warn!(tournament_id, "games unavailable, active game info omitted: {err}");
                    Vec::new()
                })
        } else {
            Vec::new()
        };
        Ok(locations
            .iter()
            .map(|location| enrich_location(location, find_game(&games, location.active_game_id.as_deref())))
            .collect())
    }

    pub fn player(&self, tournament_id: &str, player_id: &str) -> BracketResult<EnrichedPlayer> {
        let player = self.source.player(tournament_id, player_id)?;
        let mut annotator = Annotator::new(self.stats);
        Ok(enrich_player(&player, &mut annotator))
    }

    pub fn players(&self, tournament_id: &str) -> BracketResult<Vec<EnrichedPlayer>> {
        let players = self.source.players(tournament_id)?;
        let mut annotator = Annotator::new(self.stats);
        Ok(players
            .iter()
            .map(|player| enrich_player(player, &mut annotator))
            .collect())
    }

    pub fn tournament(&self, tournament_id: &str) -> BracketResult<TournamentDocument> {
        let tournament = self.source.tournament(tournament_id)?;
        let mut annotator = Annotator::new(self.stats);
        Ok(build_tournament_document(&tournament, &mut annotator))
    }

    pub fn bracket(&self, tournament_id: &str) -> BracketResult<BracketDocument> {
        let tournament = self.source.tournament(tournament_id)?;
        Ok(build_bracket_document(tournament_id, &tournament))
    }

    pub fn round(&self, tournament_id: &str, round: i64, filter: RoundFilter) -> BracketResult<RoundDocument> {
        let tournament = self.source.tournament(tournament_id)?;
        Ok(build_round_document(tournament_id, &tournament, round, filter))
    }

    pub fn standings(&self, tournament_id: &str) -> BracketResult<StandingsView> {
        let tournament = self.source.tournament(tournament_id)?;
        Ok(build_standings_view(tournament_id, &tournament))
    }
}

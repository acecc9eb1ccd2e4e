use crate::types::DOUBLE_ELIMINATION;
use serde::Serialize;
use std::cmp::Ordering;

// ── Bracket side classification ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BracketSide {
  Winners,
  Losers,
  Main,
}

impl BracketSide {
  pub fn as_str(self) -> &'static str {
    match self {
      BracketSide::Winners => "winners",
      BracketSide::Losers => "losers",
      BracketSide::Main => "main",
    }
  }

  fn rank(self) -> u8 {
    match self {
      BracketSide::Winners => 0,
      BracketSide::Main => 1,
      BracketSide::Losers => 2,
    }
  }
}

/// Bracket-local round: the side plus the unsigned round number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoundKey {
  pub side: BracketSide,
  pub number: u64,
}

impl Ord for RoundKey {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .side
      .rank()
      .cmp(&other.side.rank())
      .then(self.number.cmp(&other.number))
  }
}

impl PartialOrd for RoundKey {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl RoundKey {
  pub fn name(self) -> String {
    round_name(self)
  }

  /// Grouping label, e.g. `winners-2` or `losers-2`.
  pub fn label(self) -> String {
    format!("{}-{}", self.side.as_str(), self.number)
  }
}

pub fn is_double_elimination(format: Option<&str>) -> bool {
  format.map(|raw| raw.trim() == DOUBLE_ELIMINATION).unwrap_or(false)
}

/// Negative rounds are losers rounds, but only in double elimination. Every
/// other format is a single `main` track keyed by the absolute round.
pub fn classify_round(round: i64, format: Option<&str>) -> RoundKey {
  let number = round.unsigned_abs();
  let side = if !is_double_elimination(format) {
    BracketSide::Main
  } else if round < 0 {
    BracketSide::Losers
  } else {
    BracketSide::Winners
  };
  RoundKey { side, number }
}

/// Winners and main rounds are named by distance from the final; a depth that
/// does not match a power-of-two bracket still gets the nominal label.
pub fn round_name(key: RoundKey) -> String {
  match key.side {
    BracketSide::Losers => format!("Losers Round {}", key.number),
    BracketSide::Winners | BracketSide::Main => match key.number {
      1 => "Finals".to_string(),
      2 => "Semifinals".to_string(),
      3 => "Quarterfinals".to_string(),
      depth => match u32::try_from(depth).ok().and_then(|shift| 1u128.checked_shl(shift)) {
        Some(size) => format!("Round of {size}"),
        None => format!("Round {depth}"),
      },
    },
  }
}

// ── Qualification rounds ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationRound {
  pub code: String,
  pub name: String,
  pub description: String,
  pub win_implication: String,
  pub lose_implication: String,
}

const QUALIFICATION_ROUNDS: [(&str, &str, &str, &str, &str); 4] = [
  (
    "Q1",
    "Opening",
    "First qualifying match - all competitors start here",
    "Advances to The Cusp (Q2W)",
    "Drops to Redemption (Q2L)",
  ),
  (
    "Q2W",
    "The Cusp",
    "Second match for Opening winners - one win away from qualifying",
    "Qualifies for main bracket",
    "Drops to Bubble (Q3) for last chance",
  ),
  (
    "Q2L",
    "Redemption",
    "Second chance for Opening losers",
    "Advances to Bubble (Q3) for last chance",
    "Eliminated from tournament",
  ),
  (
    "Q3",
    "Bubble",
    "Final qualifying round - last chance to make the bracket",
    "Qualifies for main bracket",
    "Eliminated from tournament",
  ),
];

pub const QUALIFICATION_CODES: [&str; 4] = ["Q1", "Q2W", "Q2L", "Q3"];

pub const QUALIFICATION_EXPLANATION: &str = "NHRL Qualification System:

1. Opening (Q1): every competitor starts here.
   - Win: advance to The Cusp (Q2W)
   - Lose: drop to Redemption (Q2L)

2. The Cusp (Q2W): Opening winners, one win away from qualifying.
   - Win: qualify for the main bracket
   - Lose: drop to the Bubble (Q3)

3. Redemption (Q2L): second chance for Opening losers.
   - Win: advance to the Bubble (Q3)
   - Lose: eliminated

4. Bubble (Q3): final qualifying round, the last chance to make the bracket.
   - Win: qualify for the main bracket
   - Lose: eliminated

A competitor qualifies with two wins before two losses: Opening then Cusp, or one of the \
Redemption/Bubble paths. Once qualified, competitors enter the main single-elimination bracket.";

fn from_row(row: &(&str, &str, &str, &str, &str)) -> QualificationRound {
  let (code, name, description, win, lose) = *row;
  QualificationRound {
    code: code.to_string(),
    name: name.to_string(),
    description: description.to_string(),
    win_implication: win.to_string(),
    lose_implication: lose.to_string(),
  }
}

/// Exact match of a game name against the qualification vocabulary.
pub fn qualification_round(game_name: &str) -> Option<QualificationRound> {
  QUALIFICATION_ROUNDS
    .iter()
    .find(|row| row.0 == game_name)
    .map(from_row)
}

/// Case-insensitive lookup. Codes outside the vocabulary describe a generic
/// main-bracket round.
pub fn round_info(code: &str) -> QualificationRound {
  let wanted = code.trim().to_ascii_uppercase();
  QUALIFICATION_ROUNDS
    .iter()
    .find(|row| row.0 == wanted)
    .map(from_row)
    .unwrap_or_else(|| QualificationRound {
      code: code.trim().to_string(),
      name: code.trim().to_string(),
      description: "Main bracket round".to_string(),
      win_implication: "Advances to next round".to_string(),
      lose_implication: "Eliminated from tournament".to_string(),
    })
}

pub fn all_qualification_rounds() -> Vec<QualificationRound> {
  QUALIFICATION_ROUNDS.iter().map(from_row).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_double_elimination_sides() {
    let key = classify_round(-3, Some("double_elimination"));
    assert_eq!(key.side, BracketSide::Losers);
    assert_eq!(key.number, 3);
    let key = classify_round(3, Some("double_elimination"));
    assert_eq!(key.side, BracketSide::Winners);
    assert_eq!(classify_round(0, Some("double_elimination")).side, BracketSide::Winners);
  }

  #[test]
  fn test_other_formats_are_main() {
    for format in [Some("single_elimination"), Some("round_robin"), None] {
      assert_eq!(classify_round(2, format).side, BracketSide::Main);
      let key = classify_round(-2, format);
      assert_eq!(key.side, BracketSide::Main);
      assert_eq!(key.number, 2);
    }
  }

  #[test]
  fn test_depth_naming() {
    let name = |round| classify_round(round, Some("single_elimination")).name();
    assert_eq!(name(1), "Finals");
    assert_eq!(name(2), "Semifinals");
    assert_eq!(name(3), "Quarterfinals");
    assert_eq!(name(4), "Round of 16");
    assert_eq!(name(6), "Round of 64");
    assert_eq!(name(200), "Round 200");
  }

  #[test]
  fn test_losers_naming_is_flat() {
    assert_eq!(classify_round(-1, Some("double_elimination")).name(), "Losers Round 1");
    assert_eq!(classify_round(-4, Some("double_elimination")).name(), "Losers Round 4");
  }

  #[test]
  fn test_winners_round_and_losers_round_are_distinct_keys() {
    let winners = classify_round(2, Some("double_elimination"));
    let losers = classify_round(-2, Some("double_elimination"));
    assert_ne!(winners, losers);
    assert!(winners < losers);
    assert!(classify_round(5, Some("double_elimination")) < classify_round(-1, Some("double_elimination")));
    assert_eq!(losers.label(), "losers-2");
  }

  #[test]
  fn test_qualification_lookup_is_exact_on_names() {
    let q2w = qualification_round("Q2W").unwrap();
    assert_eq!(q2w.name, "The Cusp");
    assert_eq!(q2w.win_implication, "Qualifies for main bracket");
    assert!(qualification_round("q2w").is_none());
    assert!(qualification_round("Q2W-A").is_none());
  }

  #[test]
  fn test_round_info_defaults() {
    assert_eq!(round_info("q3").name, "Bubble");
    let info = round_info("W4");
    assert_eq!(info.name, "W4");
    assert_eq!(info.description, "Main bracket round");
    assert_eq!(all_qualification_rounds().len(), QUALIFICATION_CODES.len());
  }
}

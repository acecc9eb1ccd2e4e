use crate::bracket::RoundFilter;
use crate::enrich::{qualification_system, Enricher};
use crate::error::{BracketError, BracketResult};
use crate::stats::{
  bot_fights_view, bot_rank_view, bot_streak_view, event_winners_view, StatsProvider, DEFAULT_WEIGHT_CLASS,
  WEIGHT_CLASSES,
};
use crate::truefinals::TournamentSource;
use crate::types::{AppConfig, ToolsMode};
use serde_json::{Map, Value};
use tracing::info;

// ── Tool catalogue ─────────────────────────────────────────────────────

pub const TOOL_BRACKET: &str = "truefinals_bracket";
pub const TOOL_GAMES: &str = "truefinals_games";
pub const TOOL_LOCATIONS: &str = "truefinals_locations";
pub const TOOL_PLAYERS: &str = "truefinals_players";
pub const TOOL_TOURNAMENTS: &str = "truefinals_tournaments";
pub const TOOL_NHRL_STATS: &str = "nhrl_stats";

pub const TOOL_NAMES: [&str; 6] = [
  TOOL_BRACKET,
  TOOL_GAMES,
  TOOL_LOCATIONS,
  TOOL_PLAYERS,
  TOOL_TOURNAMENTS,
  TOOL_NHRL_STATS,
];

const READ_OPERATIONS: [&str; 9] = [
  "get",
  "list",
  "get_round",
  "get_standings",
  "qualification_system",
  "get_bot_rank",
  "get_bot_fights",
  "get_bot_streak_stats",
  "get_event_winners",
];

const DANGEROUS_OPERATIONS: [&str; 3] = ["delete", "disqualify", "reset"];

pub fn is_read_operation(operation: &str) -> bool {
  READ_OPERATIONS.contains(&operation)
}

pub fn is_operation_allowed(mode: ToolsMode, operation: &str) -> bool {
  match mode {
    ToolsMode::Reporting => is_read_operation(operation),
    ToolsMode::FullSafe => !DANGEROUS_OPERATIONS.contains(&operation),
    ToolsMode::Full => true,
  }
}

pub fn is_tool_disabled(config: &AppConfig, tool: &str) -> bool {
  config.disabled_tools.iter().any(|disabled| disabled == tool)
}

/// Tools the current configuration exposes at all.
pub fn enabled_tools(config: &AppConfig) -> Vec<&'static str> {
  TOOL_NAMES
    .iter()
    .copied()
    .filter(|tool| !is_tool_disabled(config, tool))
    .collect()
}

pub fn check_allowed(config: &AppConfig, tool: &str, operation: &str) -> BracketResult<()> {
  if is_tool_disabled(config, tool) {
    return Err(BracketError::OperationNotAllowed {
      tool: tool.to_string(),
      operation: operation.to_string(),
      mode: "disabled-tools".to_string(),
    });
  }
  if !is_operation_allowed(config.tools_mode(), operation) {
    return Err(BracketError::OperationNotAllowed {
      tool: tool.to_string(),
      operation: operation.to_string(),
      mode: config.tools_mode().as_str().to_string(),
    });
  }
  Ok(())
}

// ── Argument validation ────────────────────────────────────────────────

fn is_valid_id(raw: &str) -> bool {
  !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn required_id(args: &Map<String, Value>, key: &str) -> BracketResult<String> {
  match args.get(key) {
    Some(Value::String(raw)) => {
      let trimmed = raw.trim();
      if is_valid_id(trimmed) {
        Ok(trimmed.to_string())
      } else {
        Err(BracketError::invalid(format!("{key} must be a non-empty identifier, got '{raw}'")))
      }
    }
    Some(other) => Err(BracketError::invalid(format!("{key} must be a string, got {other}"))),
    None => Err(BracketError::invalid(format!("{key} is required"))),
  }
}

pub fn optional_str<'a>(args: &'a Map<String, Value>, key: &str) -> BracketResult<Option<&'a str>> {
  match args.get(key) {
    None | Some(Value::Null) => Ok(None),
    Some(Value::String(raw)) => Ok(Some(raw.as_str())),
    Some(other) => Err(BracketError::invalid(format!("{key} must be a string, got {other}"))),
  }
}

pub fn required_round(args: &Map<String, Value>) -> BracketResult<i64> {
  let value = args
    .get("round")
    .ok_or_else(|| BracketError::invalid("round is required"))?;
  let Value::Number(num) = value else {
    return Err(BracketError::invalid(format!("round must be an integer, got {value}")));
  };
  num
    .as_i64()
    .or_else(|| num.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e15).map(|f| f as i64))
    .ok_or_else(|| BracketError::invalid(format!("round must be an integer, got {num}")))
}

/// Any non-empty name without control characters, trimmed.
pub fn required_bot_name(args: &Map<String, Value>) -> BracketResult<String> {
  match optional_str(args, "bot_name")? {
    Some(raw) if !raw.trim().is_empty() && !raw.chars().any(char::is_control) => Ok(raw.trim().to_string()),
    Some(raw) => Err(BracketError::invalid(format!("bot_name must be a non-empty name, got '{raw}'"))),
    None => Err(BracketError::invalid("bot_name is required")),
  }
}

pub fn weight_class(args: &Map<String, Value>) -> BracketResult<String> {
  let Some(raw) = optional_str(args, "weight_class")? else {
    return Ok(DEFAULT_WEIGHT_CLASS.to_string());
  };
  let normalized = raw.trim().to_lowercase();
  if WEIGHT_CLASSES.contains(&normalized.as_str()) {
    Ok(normalized)
  } else {
    Err(BracketError::invalid(format!(
      "weight_class must be one of {}, got '{raw}'",
      WEIGHT_CLASSES.join(", ")
    )))
  }
}

fn round_filter(args: &Map<String, Value>) -> BracketResult<RoundFilter> {
  match optional_str(args, "bracket_type")? {
    None => Ok(RoundFilter::All),
    Some(raw) => RoundFilter::parse(raw)
      .ok_or_else(|| BracketError::invalid(format!("bracket_type must be winners, losers or all, got '{raw}'"))),
  }
}

// ── Dispatch ───────────────────────────────────────────────────────────

/// Runs one tool call. Arguments are validated and the mode checked before
/// any collaborator is contacted.
pub fn dispatch(
  config: &AppConfig,
  source: &dyn TournamentSource,
  stats: &dyn StatsProvider,
  tool: &str,
  args: &Value,
) -> BracketResult<Value> {
  if !TOOL_NAMES.contains(&tool) {
    return Err(BracketError::UnknownOperation(format!("unknown tool '{tool}'")));
  }
  let empty = Map::new();
  let args = match args {
    Value::Object(map) => map,
    Value::Null => &empty,
    other => return Err(BracketError::invalid(format!("arguments must be a JSON object, got {other}"))),
  };
  let operation = match args.get("operation") {
    Some(Value::String(raw)) if !raw.trim().is_empty() => raw.trim().to_string(),
    Some(other) => return Err(BracketError::invalid(format!("operation must be a string, got {other}"))),
    None => return Err(BracketError::invalid("operation is required")),
  };
  check_allowed(config, tool, &operation)?;
  info!(tool, operation = operation.as_str(), "dispatching tool call");

  if tool == TOOL_NHRL_STATS {
    return match operation.as_str() {
      "qualification_system" => Ok(serde_json::to_value(qualification_system(optional_str(args, "round_code")?))?),
      "get_bot_rank" => Ok(serde_json::to_value(bot_rank_view(stats, &required_bot_name(args)?)?)?),
      "get_bot_fights" => Ok(serde_json::to_value(bot_fights_view(stats, &required_bot_name(args)?)?)?),
      "get_bot_streak_stats" => Ok(serde_json::to_value(bot_streak_view(stats, &required_bot_name(args)?)?)?),
      "get_event_winners" => Ok(serde_json::to_value(event_winners_view(stats, &weight_class(args)?)?)?),
      _ => Err(BracketError::UnknownOperation(format!("{tool}.{operation}"))),
    };
  }

  let tournament_id = required_id(args, "tournament_id")?;
  let enricher = Enricher::new(source, stats);
  let value = match (tool, operation.as_str()) {
    (TOOL_BRACKET, "get") => serde_json::to_value(enricher.bracket(&tournament_id)?)?,
    (TOOL_BRACKET, "get_round") => {
      let round = required_round(args)?;
      let filter = round_filter(args)?;
      serde_json::to_value(enricher.round(&tournament_id, round, filter)?)?
    }
    (TOOL_BRACKET, "get_standings") => serde_json::to_value(enricher.standings(&tournament_id)?)?,
    (TOOL_GAMES, "list") => serde_json::to_value(enricher.games(&tournament_id)?)?,
    (TOOL_GAMES, "get") => {
      let game_id = required_id(args, "game_id")?;
      serde_json::to_value(enricher.game(&tournament_id, &game_id)?)?
    }
    (TOOL_LOCATIONS, "list") => serde_json::to_value(enricher.locations(&tournament_id)?)?,
    (TOOL_LOCATIONS, "get") => {
      let location_id = required_id(args, "location_id")?;
      serde_json::to_value(enricher.location(&tournament_id, &location_id)?)?
    }
    (TOOL_PLAYERS, "list") => serde_json::to_value(enricher.players(&tournament_id)?)?,
    (TOOL_PLAYERS, "get") => {
      let player_id = required_id(args, "player_id")?;
      serde_json::to_value(enricher.player(&tournament_id, &player_id)?)?
    }
    (TOOL_TOURNAMENTS, "get") => serde_json::to_value(enricher.tournament(&tournament_id)?)?,
    _ => return Err(BracketError::UnknownOperation(format!("{tool}.{operation}"))),
  };
  Ok(value)
}

use crate::config::append_api_log;
use crate::error::{BracketError, BracketResult};
use crate::types::*;
use serde::{de::DeserializeOwned, Serialize};
use std::{collections::HashMap, time::Duration};
use tracing::debug;

// ── Statistics provider ────────────────────────────────────────────────

/// Read-only access to historical fight statistics, keyed by bot name.
pub trait StatsProvider {
  fn bot_rank(&self, bot_name: &str) -> BracketResult<Option<u32>>;
  /// Newest first.
  fn bot_fights(&self, bot_name: &str) -> BracketResult<Vec<FightRecord>>;
  fn bot_streak(&self, bot_name: &str) -> BracketResult<Option<StreakStats>>;
  fn event_winners(&self, weight_class: &str) -> BracketResult<Vec<EventWinner>>;
}

pub fn normalize_bot_name(bot_name: &str) -> String {
  bot_name.trim().replace(' ', "_")
}

pub struct NhrlStatsClient {
  client: reqwest::blocking::Client,
  config: AppConfig,
}

impl NhrlStatsClient {
  pub fn new(config: &AppConfig) -> BracketResult<Self> {
    let client = reqwest::blocking::Client::builder()
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .user_agent(API_USER_AGENT)
      .build()
      .map_err(|e| BracketError::collaborator("NHRL stats", format!("client setup failed: {e}")))?;
    Ok(NhrlStatsClient {
      client,
      config: config.clone(),
    })
  }

  fn endpoint_url(&self, endpoint: &str) -> String {
    format!("{}/{endpoint}", self.config.stats_base_url.trim_end_matches('/'))
  }

  /// `Ok(None)` when the service answers with a literal `null`.
  fn get_json<T: DeserializeOwned>(&self, endpoint: &str, param: &str, value: &str) -> BracketResult<Option<T>> {
    let url = self.endpoint_url(endpoint);
    append_api_log(&self.config, "NHRL stats request", &format!("GET {url}?{param}={value}"));
    let resp = self
      .client
      .get(&url)
      .query(&[(param, value)])
      .header("Accept", "application/json")
      .send()
      .map_err(|e| BracketError::annotation(value, format!("request failed: {e}")))?;
    let status = resp.status();
    let body = resp
      .text()
      .map_err(|e| BracketError::annotation(value, format!("read failed: {e}")))?;
    append_api_log(&self.config, "NHRL stats response", &format!("status: {status}\nbody:\n{body}"));
    if status.as_u16() >= 400 {
      return Err(BracketError::annotation(value, format!("status {status}")));
    }
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
      return Ok(None);
    }
    serde_json::from_str::<T>(trimmed)
      .map(Some)
      .map_err(|e| BracketError::annotation(value, format!("parse failed: {e}")))
  }
}

impl StatsProvider for NhrlStatsClient {
  fn bot_rank(&self, bot_name: &str) -> BracketResult<Option<u32>> {
    let rank: Option<BotRankNode> = self.get_json("get_rank.php", "bot_name", &normalize_bot_name(bot_name))?;
    Ok(rank.and_then(|node| node.ranking))
  }

  fn bot_fights(&self, bot_name: &str) -> BracketResult<Vec<FightRecord>> {
    let fights: Option<Vec<FightRecord>> =
      self.get_json("get_fights.php", "bot_name", &normalize_bot_name(bot_name))?;
    Ok(fights.unwrap_or_default())
  }

  fn bot_streak(&self, bot_name: &str) -> BracketResult<Option<StreakStats>> {
    self.get_json("get_streak_stats.php", "bot_name", &normalize_bot_name(bot_name))
  }

  fn event_winners(&self, weight_class: &str) -> BracketResult<Vec<EventWinner>> {
    let winners: Option<Vec<EventWinner>> = self.get_json("get_event_winners.php", "weight_class", weight_class)?;
    Ok(winners.unwrap_or_default())
  }
}

// ── Annotations ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
  pub length: i64,
  #[serde(rename = "type")]
  pub kind: String,
}

impl StreakSummary {
  fn from_stats(stats: &StreakStats) -> Self {
    StreakSummary {
      length: stats.current_streak.unwrap_or(0),
      kind: stats.current_streak_type.clone().unwrap_or_default(),
    }
  }
}

/// Keys added to a participant record. Every field is omitted when its
/// lookup fails, so a miss adds nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsAnnotation {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub nhrl_rank: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub nhrl_recent_fights: Option<usize>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub nhrl_last_fight_date: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub nhrl_current_streak: Option<StreakSummary>,
}

impl StatsAnnotation {
  pub fn is_empty(&self) -> bool {
    self == &StatsAnnotation::default()
  }
}

/// The subset carried on game slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotAnnotation {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub nhrl_rank: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub nhrl_current_streak: Option<StreakSummary>,
}

fn swallow<T>(lookup: &str, bot_name: &str, result: BracketResult<T>) -> Option<T> {
  match result {
    Ok(value) => Some(value),
    Err(err) => {
      debug!(lookup, bot_name, "statistics lookup skipped: {err}");
      None
    }
  }
}

/// Request-scoped lookup memo so each distinct name is queried at most once
/// per endpoint. Dropped with the request.
pub struct Annotator<'a> {
  provider: &'a dyn StatsProvider,
  ranks: HashMap<String, Option<u32>>,
  fights: HashMap<String, Option<(usize, Option<String>)>>,
  streaks: HashMap<String, Option<StreakSummary>>,
}

impl<'a> Annotator<'a> {
  pub fn new(provider: &'a dyn StatsProvider) -> Self {
    Annotator {
      provider,
      ranks: HashMap::new(),
      fights: HashMap::new(),
      streaks: HashMap::new(),
    }
  }

  fn rank(&mut self, bot_name: &str) -> Option<u32> {
    if let Some(cached) = self.ranks.get(bot_name) {
      return *cached;
    }
    let rank = swallow("rank", bot_name, self.provider.bot_rank(bot_name)).flatten();
    self.ranks.insert(bot_name.to_string(), rank);
    rank
  }

  fn recent_fights(&mut self, bot_name: &str) -> Option<(usize, Option<String>)> {
    if let Some(cached) = self.fights.get(bot_name) {
      return cached.clone();
    }
    let recent = swallow("fights", bot_name, self.provider.bot_fights(bot_name))
      .filter(|fights| !fights.is_empty())
      .map(|fights| {
        let count = fights.len().min(RECENT_FIGHT_LIMIT);
        (count, fights[0].date.clone())
      });
    self.fights.insert(bot_name.to_string(), recent.clone());
    recent
  }

  fn streak(&mut self, bot_name: &str) -> Option<StreakSummary> {
    if let Some(cached) = self.streaks.get(bot_name) {
      return cached.clone();
    }
    let streak = swallow("streak", bot_name, self.provider.bot_streak(bot_name))
      .flatten()
      .map(|stats| StreakSummary::from_stats(&stats));
    self.streaks.insert(bot_name.to_string(), streak.clone());
    streak
  }

  /// Rank, recent activity and streak for a participant.
  pub fn participant(&mut self, bot_name: Option<&str>) -> StatsAnnotation {
    let Some(bot_name) = bot_name.map(str::trim).filter(|name| !name.is_empty()) else {
      return StatsAnnotation::default();
    };
    let recent = self.recent_fights(bot_name);
    StatsAnnotation {
      nhrl_rank: self.rank(bot_name),
      nhrl_recent_fights: recent.as_ref().map(|(count, _)| *count),
      nhrl_last_fight_date: recent.and_then(|(_, date)| date),
      nhrl_current_streak: self.streak(bot_name),
    }
  }

  pub fn slot(&mut self, bot_name: Option<&str>) -> SlotAnnotation {
    let Some(bot_name) = bot_name.map(str::trim).filter(|name| !name.is_empty()) else {
      return SlotAnnotation::default();
    };
    SlotAnnotation {
      nhrl_rank: self.rank(bot_name),
      nhrl_current_streak: self.streak(bot_name),
    }
  }

  /// First few event winners for a weight class; empty when unavailable.
  pub fn recent_champions(&mut self, weight_class: &str) -> Vec<EventWinner> {
    swallow("event winners", weight_class, self.provider.event_winners(weight_class))
      .map(|winners| winners.into_iter().take(RECENT_CHAMPION_LIMIT).collect())
      .unwrap_or_default()
  }
}

// ── Direct lookups ─────────────────────────────────────────────────────

pub const WEIGHT_CLASSES: [&str; 6] = ["3lb", "12lb", "30lb", "beetleweight", "antweight", "hobbyweight"];
pub const DEFAULT_WEIGHT_CLASS: &str = "3lb";

const RANK_MISSING: &str = "Bot not found in current rankings";
const STREAK_MISSING: &str = "No streak stats found for this bot";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BotRankView {
  pub bot_name: String,
  pub rank: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotFightsView {
  pub bot_name: String,
  pub fight_count: usize,
  pub fights: Vec<FightRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotStreakView {
  pub bot_name: String,
  pub streak_stats: Option<StreakStats>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventWinnersView {
  pub weight_class: String,
  pub event_count: usize,
  pub event_winners: Vec<EventWinner>,
}

/// Direct lookups report any provider failure as the service being unavailable.
fn lookup_failed(err: BracketError) -> BracketError {
  match err {
    BracketError::AnnotationUnavailable { name, message } => {
      BracketError::collaborator("NHRL stats", format!("lookup for '{name}' failed: {message}"))
    }
    other => other,
  }
}

pub fn bot_rank_view(provider: &dyn StatsProvider, bot_name: &str) -> BracketResult<BotRankView> {
  let rank = provider.bot_rank(bot_name).map_err(lookup_failed)?;
  Ok(BotRankView {
    bot_name: bot_name.to_string(),
    rank,
    message: rank.is_none().then_some(RANK_MISSING),
  })
}

pub fn bot_fights_view(provider: &dyn StatsProvider, bot_name: &str) -> BracketResult<BotFightsView> {
  let fights = provider.bot_fights(bot_name).map_err(lookup_failed)?;
  Ok(BotFightsView {
    bot_name: bot_name.to_string(),
    fight_count: fights.len(),
    fights,
  })
}

pub fn bot_streak_view(provider: &dyn StatsProvider, bot_name: &str) -> BracketResult<BotStreakView> {
  let streak_stats = provider.bot_streak(bot_name).map_err(lookup_failed)?;
  Ok(BotStreakView {
    bot_name: bot_name.to_string(),
    message: streak_stats.is_none().then_some(STREAK_MISSING),
    streak_stats,
  })
}

pub fn event_winners_view(provider: &dyn StatsProvider, weight_class: &str) -> BracketResult<EventWinnersView> {
  let event_winners = provider.event_winners(weight_class).map_err(lookup_failed)?;
  Ok(EventWinnersView {
    weight_class: weight_class.to_string(),
    event_count: event_winners.len(),
    event_winners,
  })
}

/// Weight class named in a tournament title, if any.
pub fn detect_weight_class(title: &str) -> Option<&'static str> {
  let lower = title.to_lowercase();
  if lower.contains("3lb") || lower.contains("beetle") {
    Some("3lb")
  } else if lower.contains("12lb") || lower.contains("antweight") {
    Some("12lb")
  } else if lower.contains("30lb") || lower.contains("hobby") {
    Some("30lb")
  } else {
    None
  }
}

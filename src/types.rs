use serde::{de::DeserializeOwned, de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use crate::error::BracketError;
use serde_json::{Map, Value};
use std::ops::Deref;
use tracing::warn;

// ── Constants ──────────────────────────────────────────────────────────

pub const TRUEFINALS_API_URL: &str = "https://truefinals.com/api";
pub const NHRL_STATS_API_URL: &str = "https://stats.nhrl.io/statsbook";
pub const API_USER_AGENT: &str = "nhrl-bracket-tool/0.0.1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const RECENT_FIGHT_LIMIT: usize = 5;
pub const RECENT_CHAMPION_LIMIT: usize = 3;
pub const DOUBLE_ELIMINATION: &str = "double_elimination";

// ── Config types ───────────────────────────────────────────────────────

/// Which operations the tool layer exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolsMode {
    Reporting,
    FullSafe,
    Full,
}

impl ToolsMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reporting" => Some(ToolsMode::Reporting),
            "full-safe" | "full_safe" => Some(ToolsMode::FullSafe),
            "full" => Some(ToolsMode::Full),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ToolsMode::Reporting => "reporting",
            ToolsMode::FullSafe => "full-safe",
            ToolsMode::Full => "full",
        }
    }
}

impl Default for ToolsMode {
    fn default() -> Self {
        ToolsMode::FullSafe
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub truefinals_base_url: String,
    pub truefinals_api_key: String,
    pub truefinals_api_user_id: String,
    pub stats_base_url: String,
    pub request_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools_mode: Option<ToolsMode>,
    pub disabled_tools: Vec<String>,
    pub log_api_traffic: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            truefinals_base_url: String::new(),
            truefinals_api_key: String::new(),
            truefinals_api_user_id: String::new(),
            stats_base_url: String::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            tools_mode: None,
            disabled_tools: Vec::new(),
            log_api_traffic: false,
        }
    }
}

impl AppConfig {
    /// Mode chosen by the CLI, config.json or `TRUEFINALS_TOOLS`, in that
    /// order; `full-safe` when none of them set one.
    pub fn tools_mode(&self) -> ToolsMode {
        self.tools_mode.unwrap_or_default()
    }
}

// ── Lenient field decoding ─────────────────────────────────────────────
//
// Records come from an external HTTP API with no schema guarantees. A field
// holding the wrong JSON type decodes as absent instead of failing the record.

pub fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(num) => num
            .as_i64()
            .or_else(|| num.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn value_to_u32(value: &Value) -> Option<u32> {
    value_to_i64(value).and_then(|num| u32::try_from(num).ok())
}

pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(num) => num.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => Some(raw.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_string(&value).filter(|id| !id.trim().is_empty()))
}

pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_i64(&value))
}

pub fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_u32(&value))
}

pub fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_u32(&value).unwrap_or(0))
}

pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_bool().unwrap_or(false))
}

/// Decodes a JSON array element by element, logging and dropping elements
/// that do not fit `T`. `None` when the value is not an array.
pub fn decode_list<T: DeserializeOwned>(value: Value) -> Option<Vec<T>> {
    let Value::Array(items) = value else {
        return None;
    };
    let decoded = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value::<T>(item) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(index = idx, "skipping {}", BracketError::MalformedRecord(err.to_string()));
                None
            }
        })
        .collect();
    Some(decoded)
}

pub fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode_list(value).unwrap_or_default())
}

// ── Wire records ───────────────────────────────────────────────────────

/// A decoded record together with the JSON object it came from.
///
/// Derived values read the typed view through `Deref`, where a field of the
/// wrong JSON type is absent. Serializing writes the original object back
/// out, so enriched documents carry every received field unchanged.
#[derive(Debug, Clone, Default)]
pub struct Record<T> {
    node: T,
    raw: Map<String, Value>,
}

impl<T> Record<T> {
    pub fn node(&self) -> &T {
        &self.node
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// The same record with `keys` dropped from the emitted object. Used where
    /// a document replaces those keys with enriched versions.
    pub fn without(&self, keys: &[&str]) -> Self
    where
        T: Clone,
    {
        let mut raw = self.raw.clone();
        for key in keys {
            raw.remove(*key);
        }
        Record {
            node: self.node.clone(),
            raw,
        }
    }
}

impl<T: DeserializeOwned> Record<T> {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let Value::Object(raw) = value else {
            return Err(<serde_json::Error as serde::de::Error>::custom("expected a JSON object"));
        };
        let node = serde_json::from_value(Value::Object(raw.clone()))?;
        Ok(Record { node, raw })
    }
}

impl<T: Serialize> From<T> for Record<T> {
    fn from(node: T) -> Self {
        let raw = match serde_json::to_value(&node) {
            Ok(Value::Object(raw)) => raw,
            _ => Map::new(),
        };
        Record { node, raw }
    }
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.node
    }
}

impl<T> Serialize for Record<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Record<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Record::from_value(value).map_err(D::Error::custom)
    }
}

// ── Game state and slot scores ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Unavailable,
    Available,
    Called,
    Active,
    Hold,
    Done,
}

impl GameState {
    pub fn is_done(self) -> bool {
        self == GameState::Done
    }

    /// Called or being fought right now.
    pub fn is_in_play(self) -> bool {
        matches!(self, GameState::Active | GameState::Called)
    }
}

/// A slot score. The service sends `-1` for a competitor who has not
/// competed yet; that value is never a result and never compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotScore {
    NotCompeted,
    Points(u32),
}

impl SlotScore {
    pub fn from_raw(raw: f64) -> Self {
        if raw < 0.0 {
            SlotScore::NotCompeted
        } else {
            SlotScore::Points(raw.round() as u32)
        }
    }

    pub fn points(self) -> Option<u32> {
        match self {
            SlotScore::Points(points) => Some(points),
            SlotScore::NotCompeted => None,
        }
    }
}

impl Serialize for SlotScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SlotScore::NotCompeted => serializer.serialize_i64(-1),
            SlotScore::Points(points) => serializer.serialize_u32(*points),
        }
    }
}

impl<'de> Deserialize<'de> for SlotScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        value_to_f64(&value)
            .map(SlotScore::from_raw)
            .ok_or_else(|| D::Error::custom("slot score must be a number"))
    }
}

// ── TrueFinals snapshot types ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentNode {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatNode>,
    #[serde(default, deserialize_with = "lenient_vec", skip_serializing_if = "Vec::is_empty")]
    pub players: Vec<Record<PlayerNode>>,
    #[serde(default, deserialize_with = "lenient_vec", skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Record<LocationNode>>,
    #[serde(default, deserialize_with = "lenient_vec", skip_serializing_if = "Vec::is_empty")]
    pub games: Vec<Record<GameNode>>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TournamentNode {
    pub fn format_type(&self) -> Option<&str> {
        self.format.as_ref().and_then(|format| format.kind.as_deref())
    }

    /// `completed` once an end time exists, `in_progress` once started.
    pub fn status(&self) -> &'static str {
        if self.end_time.is_some() {
            "completed"
        } else if self.start_time.is_some() {
            "in_progress"
        } else {
            "pending"
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatNode {
    #[serde(rename = "type", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerNode {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32", skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub wins: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub losses: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub ties: u32,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_bye: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_disqualified: bool,
    #[serde(default, deserialize_with = "lenient_u32", skip_serializing_if = "Option::is_none")]
    pub placement: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub profile_info: Option<ProfileInfoNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInfoNode {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub twitch_handle: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub twitter_handle: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationNode {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "activeGameID", default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub active_game_id: Option<String>,
    #[serde(rename = "lastCompletedGameID", default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub last_completed_game_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub queue: Vec<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub unavailable_queue: Vec<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub block_active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameNode {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "bracketID", default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub bracket_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub round: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub state: Option<GameState>,
    #[serde(default, deserialize_with = "lenient_vec", skip_serializing_if = "Vec::is_empty")]
    pub slots: Vec<GameSlotNode>,
    #[serde(default, deserialize_with = "lenient_u32", skip_serializing_if = "Option::is_none")]
    pub score_to_win: Option<u32>,
    #[serde(rename = "locationID", default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub result_annotation: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32", skip_serializing_if = "Option::is_none")]
    pub winner_placement: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32", skip_serializing_if = "Option::is_none")]
    pub loser_placement: Option<u32>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<i64>,
    #[serde(rename = "nextGameSlotIDs", default, deserialize_with = "lenient_vec", skip_serializing_if = "Vec::is_empty")]
    pub next_game_slot_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GameNode {
    pub fn is_done(&self) -> bool {
        self.state.map(GameState::is_done).unwrap_or(false)
    }

    pub fn is_in_play(&self) -> bool {
        self.state.map(GameState::is_in_play).unwrap_or(false)
    }

    /// Index of the slot with the strictly higher score in a finished game.
    /// Ties, missing slots and not-yet-competed scores yield no winner.
    pub fn winner_slot_idx(&self) -> Option<usize> {
        if !self.is_done() || self.slots.len() < 2 {
            return None;
        }
        let first = self.slots[0].score.and_then(SlotScore::points)?;
        let second = self.slots[1].score.and_then(SlotScore::points)?;
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => Some(0),
            std::cmp::Ordering::Less => Some(1),
            std::cmp::Ordering::Equal => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSlotNode {
    #[serde(rename = "gameID", default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32", skip_serializing_if = "Option::is_none")]
    pub slot_idx: Option<u32>,
    #[serde(rename = "playerID", default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub score: Option<SlotScore>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub slot_state: Option<String>,
    #[serde(rename = "prevGameID", default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub prev_game_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct TrueFinalsErrorBody {
    pub message: Option<String>,
    pub code: Option<String>,
}

// ── NHRL statsbook types ───────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct BotRankNode {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub ranking: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FightRecord {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub points: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub match_num: Option<i64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub result_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakStats {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub current_streak: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_streak_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub longest_win_streak: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub longest_lose_streak: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventWinner {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub first_place_name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub second_place_name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub third_place_name: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub fourth_place_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slot_score_sentinel() {
        let slot: GameSlotNode = serde_json::from_value(json!({ "slotIdx": 0, "score": -1 })).unwrap();
        assert_eq!(slot.score, Some(SlotScore::NotCompeted));
        assert_eq!(slot.score.and_then(SlotScore::points), None);
        assert_eq!(serde_json::to_value(slot.score).unwrap(), json!(-1));
    }

    #[test]
    fn test_wrong_typed_fields_decode_as_absent() {
        let game: GameNode = serde_json::from_value(json!({
            "id": 42,
            "name": "W1-A",
            "round": "not a number",
            "state": "exploded",
            "slots": [{ "slotIdx": 0, "score": 3 }, "garbage", { "slotIdx": 1, "score": "x" }],
            "winnerPlacement": 1,
        }))
        .unwrap();
        assert_eq!(game.id.as_deref(), Some("42"));
        assert_eq!(game.round, None);
        assert_eq!(game.state, None);
        assert_eq!(game.slots.len(), 2);
        assert_eq!(game.slots[1].score, None);
        assert_eq!(game.winner_placement, Some(1));
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({ "id": "p1", "name": "Bite Force", "lastPlayTime": 1700000000, "isBye": false });
        let player: PlayerNode = serde_json::from_value(raw).unwrap();
        let out = serde_json::to_value(&player).unwrap();
        assert_eq!(out["lastPlayTime"], json!(1700000000));
        assert_eq!(out["name"], json!("Bite Force"));
    }

    #[test]
    fn test_winner_slot_idx() {
        let mut game: GameNode = serde_json::from_value(json!({
            "state": "done",
            "slots": [{ "slotIdx": 0, "score": 3 }, { "slotIdx": 1, "score": 1 }],
        }))
        .unwrap();
        assert_eq!(game.winner_slot_idx(), Some(0));
        game.slots[1].score = Some(SlotScore::Points(3));
        assert_eq!(game.winner_slot_idx(), None);
        game.slots[1].score = Some(SlotScore::NotCompeted);
        assert_eq!(game.winner_slot_idx(), None);
        game.slots[1].score = Some(SlotScore::Points(5));
        game.state = Some(GameState::Active);
        assert_eq!(game.winner_slot_idx(), None);
    }

    #[test]
    fn test_record_keeps_unreadable_fields() {
        let raw = json!({ "id": "p1", "name": "Bot", "seed": "TBD", "placement": "DQ", "wins": null });
        let player: Record<PlayerNode> = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(player.seed, None);
        assert_eq!(player.placement, None);
        assert_eq!(player.wins, 0);
        assert_eq!(serde_json::to_value(&player).unwrap(), raw);

        let trimmed = player.without(&["seed"]);
        assert!(!trimmed.raw().contains_key("seed"));
        assert_eq!(trimmed.name.as_deref(), Some("Bot"));
    }

    #[test]
    fn test_record_rejects_non_objects() {
        assert!(Record::<GameNode>::from_value(json!("garbage")).is_err());
        let games: Vec<Record<GameNode>> = decode_list(json!([{ "id": "g1" }, 3, null])).unwrap();
        assert_eq!(games.len(), 1);
        let built = Record::from(GameNode { id: Some("g2".to_string()), ..GameNode::default() });
        assert_eq!(serde_json::to_value(&built).unwrap(), json!({ "id": "g2" }));
    }

    #[test]
    fn test_float_counts_accepted() {
        let player: PlayerNode = serde_json::from_value(json!({ "wins": 5.0, "losses": "2", "placement": null })).unwrap();
        assert_eq!(player.wins, 5);
        assert_eq!(player.losses, 2);
        assert_eq!(player.placement, None);
    }
}

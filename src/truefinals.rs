use crate::config::append_api_log;
use crate::error::{BracketError, BracketResult};
use crate::types::*;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

const SERVICE: &str = "TrueFinals";

// ── Tournament snapshot provider ───────────────────────────────────────

/// Read-only snapshots of tournament records. Nothing here writes back.
pub trait TournamentSource {
  fn tournament(&self, tournament_id: &str) -> BracketResult<Record<TournamentNode>>;
  fn players(&self, tournament_id: &str) -> BracketResult<Vec<Record<PlayerNode>>>;
  fn player(&self, tournament_id: &str, player_id: &str) -> BracketResult<Record<PlayerNode>>;
  fn locations(&self, tournament_id: &str) -> BracketResult<Vec<Record<LocationNode>>>;
  fn location(&self, tournament_id: &str, location_id: &str) -> BracketResult<Record<LocationNode>>;
  fn games(&self, tournament_id: &str) -> BracketResult<Vec<Record<GameNode>>>;
  fn game(&self, tournament_id: &str, game_id: &str) -> BracketResult<Record<GameNode>>;
}

pub struct TrueFinalsClient {
  client: reqwest::blocking::Client,
  config: AppConfig,
}

impl TrueFinalsClient {
  pub fn new(config: &AppConfig) -> BracketResult<Self> {
    let client = reqwest::blocking::Client::builder()
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .user_agent(API_USER_AGENT)
      .build()
      .map_err(|e| BracketError::collaborator(SERVICE, format!("client setup failed: {e}")))?;
    Ok(TrueFinalsClient {
      client,
      config: config.clone(),
    })
  }

  fn credentials(&self) -> BracketResult<(&str, &str)> {
    let user_id = self.config.truefinals_api_user_id.trim();
    let api_key = self.config.truefinals_api_key.trim();
    if user_id.is_empty() || api_key.is_empty() {
      return Err(BracketError::collaborator(
        SERVICE,
        "TRUEFINALS_API_USER_ID and TRUEFINALS_API_KEY must be set in .env, config.json or the shell environment.",
      ));
    }
    Ok((user_id, api_key))
  }

  fn get_body(&self, endpoint: &str) -> BracketResult<String> {
    let (user_id, api_key) = self.credentials()?;
    let url = format!("{}{endpoint}", self.config.truefinals_base_url.trim_end_matches('/'));
    append_api_log(
      &self.config,
      "TrueFinals request",
      &format!("GET {url}\nx-api-user-id: {user_id}\nx-api-key: [redacted]"),
    );
    let resp = self
      .client
      .get(&url)
      .header("x-api-user-id", user_id)
      .header("x-api-key", api_key)
      .header("Content-Type", "application/json")
      .header("Accept", "application/json")
      .send()
      .map_err(|e| {
        append_api_log(&self.config, "TrueFinals error", &format!("request failed: {e}"));
        BracketError::collaborator(SERVICE, format!("request failed: {e}"))
      })?;
    let status = resp.status();
    let body = resp
      .text()
      .map_err(|e| BracketError::collaborator(SERVICE, format!("read failed: {e}")))?;
    append_api_log(&self.config, "TrueFinals response", &format!("status: {status}\nbody:\n{body}"));
    if status.as_u16() >= 400 {
      let message = match serde_json::from_str::<TrueFinalsErrorBody>(&body) {
        Ok(err) => format!(
          "API error ({}): {} - {}",
          status.as_u16(),
          err.code.unwrap_or_default(),
          err.message.unwrap_or_default()
        ),
        Err(_) => format!("HTTP error {}: {body}", status.as_u16()),
      };
      warn!(endpoint, "{message}");
      return Err(BracketError::collaborator(SERVICE, message));
    }
    Ok(body)
  }

  fn get_one<T: DeserializeOwned>(&self, endpoint: &str) -> BracketResult<T> {
    let body = self.get_body(endpoint)?;
    serde_json::from_str::<T>(&body)
      .map_err(|e| BracketError::collaborator(SERVICE, format!("parse {endpoint} failed: {e}")))
  }

  fn get_list<T: DeserializeOwned>(&self, endpoint: &str) -> BracketResult<Vec<T>> {
    let body = self.get_body(endpoint)?;
    let value: Value = serde_json::from_str(&body)
      .map_err(|e| BracketError::collaborator(SERVICE, format!("parse {endpoint} failed: {e}")))?;
    decode_list(value).ok_or_else(|| BracketError::collaborator(SERVICE, format!("{endpoint} did not return a list")))
  }
}

impl TournamentSource for TrueFinalsClient {
  fn tournament(&self, tournament_id: &str) -> BracketResult<Record<TournamentNode>> {
    self.get_one(&format!("/v1/tournaments/{tournament_id}"))
  }

  fn players(&self, tournament_id: &str) -> BracketResult<Vec<Record<PlayerNode>>> {
    self.get_list(&format!("/v1/tournaments/{tournament_id}/players"))
  }

  fn player(&self, tournament_id: &str, player_id: &str) -> BracketResult<Record<PlayerNode>> {
    self.get_one(&format!("/v1/tournaments/{tournament_id}/players/{player_id}"))
  }

  fn locations(&self, tournament_id: &str) -> BracketResult<Vec<Record<LocationNode>>> {
    self.get_list(&format!("/v1/tournaments/{tournament_id}/locations"))
  }

  fn location(&self, tournament_id: &str, location_id: &str) -> BracketResult<Record<LocationNode>> {
    self.get_one(&format!("/v1/tournaments/{tournament_id}/locations/{location_id}"))
  }

  fn games(&self, tournament_id: &str) -> BracketResult<Vec<Record<GameNode>>> {
    self.get_list(&format!("/v1/tournaments/{tournament_id}/games"))
  }

  fn game(&self, tournament_id: &str, game_id: &str) -> BracketResult<Record<GameNode>> {
    self.get_one(&format!("/v1/tournaments/{tournament_id}/games/{game_id}"))
  }
}

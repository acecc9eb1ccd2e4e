use crate::error::{BracketError, BracketResult};
use crate::types::*;
use chrono::Local;
use std::{
  env,
  fs,
  io::Write,
  path::{Path, PathBuf},
};

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn config_path() -> PathBuf {
  repo_root().join("config.json")
}

pub fn logs_dir() -> PathBuf {
  repo_root().join("logs")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn env_flag_true(key: &str) -> bool {
  match env::var(key) {
    Ok(value) => {
      let value = value.trim().to_ascii_lowercase();
      matches!(value.as_str(), "1" | "true" | "yes" | "on")
    }
    Err(_) => false,
  }
}

pub fn split_tool_list(raw: &str) -> Vec<String> {
  raw
    .split(',')
    .map(|item| item.trim().to_string())
    .filter(|item| !item.is_empty())
    .collect()
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  if config.truefinals_api_key.trim().is_empty() {
    if let Some(value) = env_default("TRUEFINALS_API_KEY") {
      config.truefinals_api_key = value;
    }
  }
  if config.truefinals_api_user_id.trim().is_empty() {
    if let Some(value) = env_default("TRUEFINALS_API_USER_ID") {
      config.truefinals_api_user_id = value;
    }
  }
  if config.truefinals_base_url.trim().is_empty() {
    config.truefinals_base_url =
      env_default("TRUEFINALS_BASE_URL").unwrap_or_else(|| TRUEFINALS_API_URL.to_string());
  }
  if config.stats_base_url.trim().is_empty() {
    config.stats_base_url = env_default("NHRL_STATS_BASE_URL").unwrap_or_else(|| NHRL_STATS_API_URL.to_string());
  }
  if config.tools_mode.is_none() {
    if let Some(raw) = env_default("TRUEFINALS_TOOLS") {
      config.tools_mode = ToolsMode::parse(&raw);
      if config.tools_mode.is_none() {
        tracing::warn!("ignoring TRUEFINALS_TOOLS={raw}; expected reporting, full-safe or full");
      }
    }
  }
  if config.disabled_tools.is_empty() {
    if let Some(value) = env_default("TRUEFINALS_DISABLED_TOOLS") {
      config.disabled_tools = split_tool_list(&value);
    }
  }
  if config.request_timeout_secs == 0 {
    config.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
  }
  if !config.log_api_traffic {
    config.log_api_traffic = env_flag_true("NHRL_LOG_API_TRAFFIC");
  }
  config
}

pub fn load_config_inner() -> BracketResult<AppConfig> {
  load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> BracketResult<AppConfig> {
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(path)
    .map_err(|e| BracketError::invalid(format!("read config {}: {e}", path.display())))?;
  let config = serde_json::from_str::<AppConfig>(&data)
    .map_err(|e| BracketError::invalid(format!("parse config {}: {e}", path.display())))?;
  Ok(apply_env_defaults(config))
}

pub fn load_env_file() {
  let env_path = repo_root().join(".env");
  if !env_path.is_file() {
    return;
  }
  let contents = match fs::read_to_string(&env_path) {
    Ok(data) => data,
    Err(_) => return,
  };
  for line in contents.lines() {
    if let Some((key, value)) = parse_env_line(line) {
      if env::var_os(&key).is_none() {
        env::set_var(key, value);
      }
    }
  }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let trimmed = line.trim();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return None;
  }
  let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
  let (key, raw_value) = trimmed.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let mut value = raw_value.trim();
  let quoted = value.len() >= 2
    && ((value.starts_with('"') && value.ends_with('"')) || (value.starts_with('\'') && value.ends_with('\'')));
  if quoted {
    value = &value[1..value.len() - 1];
  } else if let Some(idx) = value.find('#') {
    value = value[..idx].trim_end();
  }
  Some((key.to_string(), value.to_string()))
}

pub fn log_env_warnings(config: &AppConfig) {
  let mut warnings = Vec::new();

  if config.truefinals_api_key.trim().is_empty() {
    warnings.push("TRUEFINALS_API_KEY not set and no API key in config; tournament lookups will fail");
  }
  if config.truefinals_api_user_id.trim().is_empty() {
    warnings.push("TRUEFINALS_API_USER_ID not set and no user id in config; tournament lookups will fail");
  }
  if config.tools_mode() == ToolsMode::Full {
    warnings.push("tools mode is 'full'; delete, disqualify and reset are not blocked");
  }

  for msg in warnings {
    tracing::warn!("{}", msg);
  }
}

// ── API traffic log ────────────────────────────────────────────────────

pub fn api_traffic_log_path() -> PathBuf {
  logs_dir().join("api_traffic.log")
}

pub fn append_api_log(config: &AppConfig, label: &str, payload: &str) {
  if !config.log_api_traffic {
    return;
  }
  let dir = logs_dir();
  if fs::create_dir_all(&dir).is_err() {
    return;
  }
  let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
  let entry = format!("[{timestamp}] {label}\n{payload}\n\n");
  if let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(api_traffic_log_path()) {
    let _ = file.write_all(entry.as_bytes());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_env_line() {
    assert_eq!(
      parse_env_line("export TRUEFINALS_API_KEY=\"abc 123\""),
      Some(("TRUEFINALS_API_KEY".to_string(), "abc 123".to_string()))
    );
    assert_eq!(
      parse_env_line("TRUEFINALS_TOOLS=reporting # read only"),
      Some(("TRUEFINALS_TOOLS".to_string(), "reporting".to_string()))
    );
    assert_eq!(parse_env_line("# comment"), None);
    assert_eq!(parse_env_line("   "), None);
    assert_eq!(parse_env_line("=value"), None);
  }

  #[test]
  fn test_split_tool_list() {
    assert_eq!(
      split_tool_list(" truefinals_games, ,nhrl_stats "),
      vec!["truefinals_games".to_string(), "nhrl_stats".to_string()]
    );
    assert!(split_tool_list("").is_empty());
  }

  #[test]
  fn test_config_file_fields_win_over_defaults() {
    let raw = r#"{ "truefinalsBaseUrl": "http://localhost:9000", "statsBaseUrl": "http://localhost:9001",
      "toolsMode": "reporting", "disabledTools": ["nhrl_stats"], "requestTimeoutSecs": 5 }"#;
    let config = apply_env_defaults(serde_json::from_str::<AppConfig>(raw).unwrap());
    assert_eq!(config.truefinals_base_url, "http://localhost:9000");
    assert_eq!(config.stats_base_url, "http://localhost:9001");
    assert_eq!(config.disabled_tools, vec!["nhrl_stats".to_string()]);
    assert_eq!(config.request_timeout_secs, 5);
    assert_eq!(config.tools_mode, Some(ToolsMode::Reporting));
  }

  #[test]
  fn test_config_file_mode_beats_environment() {
    let path = env::temp_dir().join(format!("nhrl-bracket-tool-config-{}.json", std::process::id()));
    fs::write(&path, r#"{ "toolsMode": "reporting" }"#).unwrap();
    env::set_var("TRUEFINALS_TOOLS", "full");
    let from_file = load_config_from(&path);
    let from_env = apply_env_defaults(AppConfig::default());
    env::remove_var("TRUEFINALS_TOOLS");
    fs::remove_file(&path).ok();

    assert_eq!(from_file.unwrap().tools_mode(), ToolsMode::Reporting);
    assert_eq!(from_env.tools_mode(), ToolsMode::Full);
  }

  #[test]
  fn test_missing_config_file_uses_defaults() {
    let config = load_config_from(Path::new("/nonexistent/config.json")).unwrap();
    assert!(!config.truefinals_base_url.is_empty());
    assert!(!config.stats_base_url.is_empty());
    assert!(config.request_timeout_secs > 0);
  }
}

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod identity;
pub mod rounds;
pub mod bracket;
pub mod standings;
pub mod stats;
pub mod truefinals;
pub mod enrich;
pub mod tools;

use types::*;
use config::*;
use error::{BracketError, BracketResult};
use stats::NhrlStatsClient;
use truefinals::TrueFinalsClient;

use clap::Parser;
use serde_json::{json, Value};
use std::process::ExitCode;
use tracing::{error, info};

// ── Command line ───────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "nhrl-bracket-tool")]
#[command(about = "Bracket views and stats enrichment for NHRL tournaments on TrueFinals")]
#[command(version)]
pub struct Cli {
    /// Tool to run, e.g. truefinals_bracket. Lists the enabled tools when omitted.
    pub tool: Option<String>,
    /// Tool arguments as a JSON object, e.g. '{"operation":"get","tournament_id":"abc"}'
    pub args: Option<String>,
    /// TrueFinals API key (overrides TRUEFINALS_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
    /// TrueFinals API user id (overrides TRUEFINALS_API_USER_ID)
    #[arg(long)]
    pub api_user_id: Option<String>,
    /// TrueFinals base URL (overrides TRUEFINALS_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,
    /// Tools mode: reporting, full-safe or full (overrides TRUEFINALS_TOOLS)
    #[arg(long, value_parser = parse_tools_mode)]
    pub tools: Option<ToolsMode>,
    /// Comma-separated tools to disable (overrides TRUEFINALS_DISABLED_TOOLS)
    #[arg(long)]
    pub disabled_tools: Option<String>,
}

fn parse_tools_mode(raw: &str) -> Result<ToolsMode, String> {
    ToolsMode::parse(raw)
        .ok_or_else(|| format!("invalid tools mode '{raw}'. Valid options: reporting, full-safe, full"))
}

pub fn apply_cli_overrides(mut config: AppConfig, cli: &Cli) -> AppConfig {
    if let Some(value) = cli.api_key.as_ref().filter(|v| !v.trim().is_empty()) {
        config.truefinals_api_key = value.trim().to_string();
    }
    if let Some(value) = cli.api_user_id.as_ref().filter(|v| !v.trim().is_empty()) {
        config.truefinals_api_user_id = value.trim().to_string();
    }
    if let Some(value) = cli.base_url.as_ref().filter(|v| !v.trim().is_empty()) {
        config.truefinals_base_url = value.trim().to_string();
    }
    if let Some(mode) = cli.tools {
        config.tools_mode = Some(mode);
    }
    if let Some(raw) = cli.disabled_tools.as_deref() {
        config.disabled_tools = split_tool_list(raw);
    }
    config
}

fn parse_tool_args(raw: Option<&str>) -> BracketResult<Value> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty()).unwrap_or("{}");
    serde_json::from_str(raw).map_err(|e| BracketError::invalid(format!("arguments are not valid JSON: {e}")))
}

/// Resolves configuration, runs the requested tool and renders its output.
pub fn execute(cli: &Cli) -> BracketResult<String> {
    let config = apply_cli_overrides(load_config_inner()?, cli);
    log_env_warnings(&config);
    if !config.disabled_tools.is_empty() {
        info!("Disabled tools: {:?}", config.disabled_tools);
    }

    let Some(tool) = cli.tool.as_deref() else {
        let listing = json!({
            "toolsMode": config.tools_mode(),
            "tools": tools::enabled_tools(&config),
        });
        return Ok(serde_json::to_string_pretty(&listing)?);
    };
    let args = parse_tool_args(cli.args.as_deref())?;
    let source = TrueFinalsClient::new(&config)?;
    let stats = NhrlStatsClient::new(&config)?;
    let output = tools::dispatch(&config, &source, &stats, tool, &args)?;
    Ok(serde_json::to_string_pretty(&output)?)
}

pub fn run() -> ExitCode {
    load_env_file();
    let cli = Cli::parse();

    let _guard = logging::init_tracing(&logs_dir());
    info!("NHRL bracket tool starting");

    match execute(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_win() {
        let cli = Cli::try_parse_from([
            "nhrl-bracket-tool",
            "truefinals_bracket",
            r#"{"operation":"get"}"#,
            "--api-key",
            "key-1",
            "--tools",
            "reporting",
            "--disabled-tools",
            "truefinals_games, nhrl_stats",
        ])
        .unwrap();
        let config = apply_cli_overrides(AppConfig::default(), &cli);
        assert_eq!(config.truefinals_api_key, "key-1");
        assert_eq!(config.tools_mode(), ToolsMode::Reporting);
        assert_eq!(config.disabled_tools, vec!["truefinals_games".to_string(), "nhrl_stats".to_string()]);
        assert_eq!(cli.tool.as_deref(), Some("truefinals_bracket"));
    }

    #[test]
    fn test_invalid_tools_mode_rejected() {
        let parsed = Cli::try_parse_from(["nhrl-bracket-tool", "--tools", "admin"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parse_tool_args() {
        assert_eq!(parse_tool_args(None).unwrap(), json!({}));
        assert_eq!(parse_tool_args(Some("  ")).unwrap(), json!({}));
        assert_eq!(parse_tool_args(Some(r#"{"round":2}"#)).unwrap()["round"], json!(2));
        assert!(matches!(parse_tool_args(Some("{oops")), Err(BracketError::InvalidInput(_))));
    }
}

use std::path::PathBuf;

use clap::Parser;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "hublink",
    about = "Chat-workspace GitHub bridge: webhook ingress and slash commands",
    version
)]
pub struct CliArgs {
    /// Address the webhook server binds to.
    #[arg(long, default_value = "127.0.0.1:8585", env = "HUBLINK_BIND")]
    pub bind: String,

    /// Externally reachable URL GitHub delivers webhooks to.
    #[arg(long, env = "HUBLINK_CALLBACK_URL")]
    pub callback_url: String,

    /// JSON state file backing the association store.
    #[arg(long, default_value = "hublink-state.json", env = "HUBLINK_STATE_FILE")]
    pub state_file: PathBuf,

    /// User id whose event subscriptions gate webhook ingress.
    #[arg(long, env = "HUBLINK_SUBSCRIBER")]
    pub subscriber: String,

    /// Username alias stamped on bot-identity messages.
    #[arg(long, default_value = "git-bot", env = "HUBLINK_BOT_ALIAS")]
    pub bot_alias: String,

    /// Shared secret for X-Hub-Signature-256 verification.
    #[arg(long, env = "HUBLINK_WEBHOOK_SECRET")]
    pub webhook_secret: Option<String>,

    /// JSONL file receiving ingress diagnostics.
    #[arg(long, env = "HUBLINK_DIAGNOSTICS_LOG")]
    pub diagnostics_log: Option<PathBuf>,

    /// GitHub API base URL.
    #[arg(long, default_value = hublink_github::GITHUB_API_BASE, env = "HUBLINK_GITHUB_API_BASE")]
    pub github_api_base: String,

    /// Outbound request timeout in milliseconds.
    #[arg(long, default_value_t = 10_000, value_parser = parse_positive_u64, env = "HUBLINK_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,
}

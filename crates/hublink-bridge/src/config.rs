//! Bridge configuration.

use hublink_github::GITHUB_API_BASE;

pub const DEFAULT_BOT_ALIAS: &str = "git-bot";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Event kinds registered on the GitHub hook when `connect` runs.
pub fn default_hook_events() -> Vec<String> {
    ["issues", "issue_comment", "push", "pull_request"]
        .iter()
        .map(|kind| kind.to_string())
        .collect()
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Externally reachable URL GitHub will deliver webhook payloads to.
    pub webhook_callback_url: String,
    pub github_api_base: String,
    pub request_timeout_ms: u64,
    /// Username alias stamped on bot-identity messages.
    pub bot_alias: String,
    /// The webhook subscriber binding: whose SubscribedEvents gate ingress.
    pub subscriber_user_id: String,
    /// Shared secret for `X-Hub-Signature-256` verification; also registered
    /// on hooks created by `connect`. None disables verification.
    pub webhook_secret: Option<String>,
    pub hook_events: Vec<String>,
}

impl BridgeConfig {
    pub fn new(webhook_callback_url: impl Into<String>, subscriber_user_id: impl Into<String>) -> Self {
        Self {
            webhook_callback_url: webhook_callback_url.into(),
            github_api_base: GITHUB_API_BASE.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            bot_alias: DEFAULT_BOT_ALIAS.to_string(),
            subscriber_user_id: subscriber_user_id.into(),
            webhook_secret: None,
            hook_events: default_hook_events(),
        }
    }
}

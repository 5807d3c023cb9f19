//! Webhook ingress: payload normalization, subscription and room-mapping
//! resolution, event routing, and chat-message templating.
//!
//! Every branch converges on an acknowledged outcome. Mapping misses,
//! unsubscribed events, and malformed payloads are reason-coded skips, never
//! errors: the HTTP layer must answer 2xx regardless, or GitHub retries and
//! eventually disables the hook.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use hublink_store::BridgeStore;

use crate::capabilities::{ChatNotifier, OutboundMessage, RoomDirectory};

pub const GITHUB_EVENT_HEADER: &str = "x-github-event";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventKind {
    Issues,
    IssueComment,
    Push,
    PullRequest,
}

impl WebhookEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::IssueComment => "issue_comment",
            Self::Push => "push",
            Self::PullRequest => "pull_request",
        }
    }

    /// Maps an `x-github-event` header value onto a handled kind.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "issues" => Some(Self::Issues),
            "issue_comment" => Some(Self::IssueComment),
            "push" => Some(Self::Push),
            "pull_request" => Some(Self::PullRequest),
            _ => None,
        }
    }

    pub fn supported() -> &'static [Self] {
        &[Self::Issues, Self::IssueComment, Self::Push, Self::PullRequest]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookPayloadErrorCode {
    InvalidJson,
    MissingPayloadField,
}

impl WebhookPayloadErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidJson => "invalid_json",
            Self::MissingPayloadField => "missing_payload_field",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookPayloadError {
    pub code: WebhookPayloadErrorCode,
    pub message: String,
}

impl Display for WebhookPayloadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for WebhookPayloadError {}

/// Normalizes the two delivery formats GitHub uses into one JSON value:
/// a raw JSON body, or a form-encoded body whose `payload` field holds the
/// JSON text (the legacy form delivery format).
pub fn normalize_webhook_payload(
    content_type: &str,
    body: &str,
) -> Result<Value, WebhookPayloadError> {
    let raw_json = if content_type
        .to_ascii_lowercase()
        .contains(FORM_CONTENT_TYPE)
    {
        url::form_urlencoded::parse(body.as_bytes())
            .find(|(key, _)| key == "payload")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| WebhookPayloadError {
                code: WebhookPayloadErrorCode::MissingPayloadField,
                message: "form body has no payload field".to_string(),
            })?
    } else {
        body.to_string()
    };

    serde_json::from_str::<Value>(&raw_json).map_err(|error| WebhookPayloadError {
        code: WebhookPayloadErrorCode::InvalidJson,
        message: error.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookSkipReason {
    EventNotSubscribed,
    PayloadParseFailed,
    RepoNotResolved,
    RepoNotConnected,
    RoomNotFound,
    EventKindUnhandled,
    MessageRenderFailed,
}

impl WebhookSkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EventNotSubscribed => "event_not_subscribed",
            Self::PayloadParseFailed => "payload_parse_failed",
            Self::RepoNotResolved => "repo_not_resolved",
            Self::RepoNotConnected => "repo_not_connected",
            Self::RoomNotFound => "room_not_found",
            Self::EventKindUnhandled => "event_kind_unhandled",
            Self::MessageRenderFailed => "message_render_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Delivered {
        event: WebhookEventKind,
        room_id: String,
    },
    Skipped {
        reason: WebhookSkipReason,
        detail: String,
    },
}

impl WebhookOutcome {
    fn skipped(reason: WebhookSkipReason, detail: impl Into<String>) -> Self {
        Self::Skipped {
            reason,
            detail: detail.into(),
        }
    }
}

/// One inbound webhook call, as received by the HTTP layer.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    /// `x-github-event` header value.
    pub event: String,
    pub content_type: String,
    pub body: String,
}

/// Single-pass ingress: no retries, no queue. The subscriber whose event
/// list gates deliveries is an injected binding, not a process-wide lookup.
pub struct WebhookIngress {
    store: BridgeStore,
    rooms: Arc<dyn RoomDirectory>,
    notifier: Arc<dyn ChatNotifier>,
    subscriber_user_id: String,
    bot_alias: String,
}

impl WebhookIngress {
    pub fn new(
        store: BridgeStore,
        rooms: Arc<dyn RoomDirectory>,
        notifier: Arc<dyn ChatNotifier>,
        subscriber_user_id: impl Into<String>,
        bot_alias: impl Into<String>,
    ) -> Self {
        Self {
            store,
            rooms,
            notifier,
            subscriber_user_id: subscriber_user_id.into(),
            bot_alias: bot_alias.into(),
        }
    }

    /// Resolves one delivery to a chat message or a reason-coded skip.
    /// Errors escape only on store/notifier transport failures; the HTTP
    /// layer still acknowledges those with a success status.
    pub async fn handle_delivery(&self, delivery: &WebhookDelivery) -> Result<WebhookOutcome> {
        let subscribed = self
            .store
            .subscribed_events(&self.subscriber_user_id)
            .await?
            .unwrap_or_default();
        let event_name = delivery.event.trim();
        if !subscribed.iter().any(|event| event == event_name) {
            return Ok(WebhookOutcome::skipped(
                WebhookSkipReason::EventNotSubscribed,
                format!("event '{event_name}' is not in the subscription list"),
            ));
        }

        let payload = match normalize_webhook_payload(&delivery.content_type, &delivery.body) {
            Ok(payload) => payload,
            Err(error) => {
                return Ok(WebhookOutcome::skipped(
                    WebhookSkipReason::PayloadParseFailed,
                    error.to_string(),
                ));
            }
        };

        let Some(repo_slug) = payload_str(&payload, &["repository", "full_name"]) else {
            return Ok(WebhookOutcome::skipped(
                WebhookSkipReason::RepoNotResolved,
                "payload has no repository.full_name",
            ));
        };
        let Some(room_id) = self.store.room_for_repo(&repo_slug).await? else {
            return Ok(WebhookOutcome::skipped(
                WebhookSkipReason::RepoNotConnected,
                format!("repository '{repo_slug}' is not connected to a room"),
            ));
        };
        let Some(room) = self.rooms.room_by_id(&room_id).await? else {
            return Ok(WebhookOutcome::skipped(
                WebhookSkipReason::RoomNotFound,
                format!("room '{room_id}' no longer resolves"),
            ));
        };

        let Some(kind) = WebhookEventKind::parse(event_name) else {
            return Ok(WebhookOutcome::skipped(
                WebhookSkipReason::EventKindUnhandled,
                format!("no message template for event '{event_name}'"),
            ));
        };
        let Some(message) = render_event_message(kind, &payload, &self.bot_alias) else {
            return Ok(WebhookOutcome::skipped(
                WebhookSkipReason::MessageRenderFailed,
                format!("payload for '{event_name}' is missing template fields"),
            ));
        };

        self.notifier.post_room_message(&room, message).await?;
        Ok(WebhookOutcome::Delivered {
            event: kind,
            room_id,
        })
    }
}

/// Builds the bot-identity chat message for a handled event kind: actor
/// display name + link, subject link, repository name + link. Returns None
/// when the payload lacks the template's fields.
pub fn render_event_message(
    kind: WebhookEventKind,
    payload: &Value,
    bot_alias: &str,
) -> Option<OutboundMessage> {
    let repo_name = payload_str(payload, &["repository", "full_name"])?;
    let repo_url = payload_str(payload, &["repository", "html_url"])?;
    let repo_link = format!("[{repo_name}]({repo_url})");
    let actor = payload_str(payload, &["sender", "login"])?;
    let actor_url =
        payload_str(payload, &["sender", "html_url"]).unwrap_or_else(|| repo_url.clone());
    let actor_link = format!("[{actor}]({actor_url})");

    let text = match kind {
        WebhookEventKind::Issues => {
            let action = payload_str(payload, &["action"]).unwrap_or_else(|| "updated".to_string());
            let issue_url = payload_str(payload, &["issue", "html_url"])?;
            format!("{actor_link} {action} issue {issue_url} in repository {repo_link}")
        }
        WebhookEventKind::IssueComment => {
            let comment_url = payload_str(payload, &["comment", "html_url"])
                .or_else(|| payload_str(payload, &["issue", "html_url"]))?;
            format!("{actor_link} commented {comment_url} in repository {repo_link}")
        }
        WebhookEventKind::Push => {
            let commits = payload
                .get("commits")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0);
            let compare_url = payload_str(payload, &["compare"]).unwrap_or_else(|| repo_url.clone());
            format!(
                "{actor_link} pushed {commits} commit{} to repository {repo_link} ({compare_url})",
                if commits == 1 { "" } else { "s" }
            )
        }
        WebhookEventKind::PullRequest => {
            let action = payload_str(payload, &["action"]).unwrap_or_else(|| "updated".to_string());
            let pr_url = payload_str(payload, &["pull_request", "html_url"])?;
            format!("{actor_link} {action} pull request {pr_url} in repository {repo_link}")
        }
    };

    Some(OutboundMessage {
        text,
        alias: Some(bot_alias.to_string()),
        avatar_url: payload_str(payload, &["sender", "avatar_url"]),
        attachments: Vec::new(),
    })
}

fn payload_str(payload: &Value, path: &[&str]) -> Option<String> {
    let mut cursor = payload;
    for key in path {
        cursor = cursor.as_object().and_then(|object: &Map<String, Value>| object.get(*key))?;
    }
    cursor
        .as_str()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(str::to_string)
}

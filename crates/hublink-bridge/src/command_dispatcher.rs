//! Command routing and pagination replay.
//!
//! One parameterized dispatch table routes every `/github` command to its
//! handler. Handlers that support pagination (`user`, `issue`) persist their
//! own invocation as a tagged replay record on success; the replay token
//! re-enters the matching handler with the stored arguments and a fresh page
//! cursor. Network and API failures are caught per-handler and surfaced as a
//! notification to the invoking user; they never crash the dispatcher.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use hublink_github::{extract_image_urls, parse_repo_slug, GithubApiClient};
use hublink_store::{BridgeStore, ReplayCommand};

use crate::capabilities::{
    ChatNotifier, ChatUser, MessageAttachment, ModalPresenter, OutboundMessage, Room,
};
use crate::commands::{parse_bridge_command, BridgeCommand};
use crate::config::BridgeConfig;
use crate::issue_modal::{build_issue_compose_view, IssueComposeMode};
use crate::render::{help_text, render_issue_detail, render_issue_summary, render_repo_line};
use crate::webhook_ingress::WebhookEventKind;

const SET_TOKEN_REMEDIATION: &str =
    "You haven't configured your access token yet. Please run `/github set-token YOUR_ACCESS_TOKEN`";

/// The room and sender a slash-command invocation arrived from, resolved by
/// the host. `trigger_id` is present for interactive invocations that may
/// open a modal.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub sender: ChatUser,
    pub room: Room,
    pub trigger_id: Option<String>,
}

/// View state handed back by the host when the issue-compose modal is
/// submitted. `context` is the value the view was built with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueComposeSubmission {
    pub mode: IssueComposeMode,
    pub title: String,
    pub description: String,
    pub context: serde_json::Value,
}

pub struct CommandDispatcher {
    store: BridgeStore,
    notifier: Arc<dyn ChatNotifier>,
    modals: Arc<dyn ModalPresenter>,
    config: BridgeConfig,
}

impl CommandDispatcher {
    pub fn new(
        store: BridgeStore,
        notifier: Arc<dyn ChatNotifier>,
        modals: Arc<dyn ModalPresenter>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            modals,
            config,
        }
    }

    /// Entry point for one slash-command invocation.
    pub async fn dispatch(&self, ctx: &CommandContext, args: &[String]) -> Result<()> {
        match parse_bridge_command(args) {
            BridgeCommand::Connect { repo_url } => self.handle_connect(ctx, &repo_url).await,
            BridgeCommand::SetToken { token } => self.handle_set_token(ctx, &token).await,
            BridgeCommand::User { username, page } => self.handle_user(ctx, &username, page).await,
            BridgeCommand::Issue {
                owner,
                repo,
                number,
                page,
            } => self.handle_issue(ctx, &owner, &repo, number, page).await,
            BridgeCommand::Create { owner, repo } => self.handle_create(ctx, &owner, &repo).await,
            BridgeCommand::Subscribe { events } => self.handle_subscribe(ctx, &events).await,
            BridgeCommand::Disconnect { repo_url } => self.handle_disconnect(ctx, &repo_url).await,
            BridgeCommand::Help => self.notify(ctx, help_text()).await,
            BridgeCommand::Replay { page } => self.handle_replay(ctx, page).await,
            BridgeCommand::Unknown { command } => {
                self.notify(
                    ctx,
                    format!("Unknown command `{command}`. Try `/github help`."),
                )
                .await
            }
            BridgeCommand::Invalid { message } => self.notify(ctx, message).await,
        }
    }

    /// Replays the stored command with a new page cursor. An empty replay
    /// slot is a no-op: nothing to repeat, nothing sent.
    async fn handle_replay(&self, ctx: &CommandContext, page: u32) -> Result<()> {
        match self.store.last_command(&ctx.sender.id).await? {
            None => Ok(()),
            Some(ReplayCommand::User { username }) => self.handle_user(ctx, &username, page).await,
            Some(ReplayCommand::Issue { owner, repo }) => {
                self.handle_issue(ctx, &owner, &repo, None, page).await
            }
        }
    }

    async fn handle_connect(&self, ctx: &CommandContext, repo_url: &str) -> Result<()> {
        let Some(slug) = parse_repo_slug(repo_url) else {
            return self.notify(ctx, "Invalid GitHub repository address").await;
        };
        let Some(client) = self.authorized_client(ctx).await? else {
            return Ok(());
        };

        if let Err(error) = client
            .create_webhook(
                &slug.owner,
                &slug.name,
                &self.config.webhook_callback_url,
                &self.config.hook_events,
                self.config.webhook_secret.as_deref(),
            )
            .await
        {
            eprintln!("connect command failed: repo={slug} error={error:#}");
            return self.notify(ctx, "Error connecting to the repository").await;
        }

        self.store
            .link_repo_to_room(&slug.slug(), &ctx.room.id)
            .await?;
        self.notify(
            ctx,
            format!("Successfully connected `{slug}` to this room"),
        )
        .await
    }

    async fn handle_set_token(&self, ctx: &CommandContext, token: &str) -> Result<()> {
        self.store.set_access_token(&ctx.sender.id, token).await?;
        self.notify(ctx, "Successfully stored your access token").await
    }

    async fn handle_user(&self, ctx: &CommandContext, username: &str, page: u32) -> Result<()> {
        let Some(client) = self.authorized_client(ctx).await? else {
            return Ok(());
        };
        let repos = match client.list_user_repos(username, page).await {
            Ok(repos) => repos,
            Err(error) => {
                eprintln!("user command failed: username={username} page={page} error={error:#}");
                return self
                    .notify(ctx, "Error fetching repositories from GitHub")
                    .await;
            }
        };

        if repos.is_empty() {
            self.notify(
                ctx,
                format!("No repositories for `{username}` on page {page}"),
            )
            .await?;
        }
        for repo in &repos {
            self.post(ctx, OutboundMessage::text(render_repo_line(repo)))
                .await?;
        }

        self.store
            .store_last_command(
                &ctx.sender.id,
                &ReplayCommand::User {
                    username: username.to_string(),
                },
            )
            .await
    }

    async fn handle_issue(
        &self,
        ctx: &CommandContext,
        owner: &str,
        repo: &str,
        number: Option<u64>,
        page: u32,
    ) -> Result<()> {
        let Some(client) = self.authorized_client(ctx).await? else {
            return Ok(());
        };

        match number {
            Some(number) => {
                let issue = match client.fetch_issue(owner, repo, number).await {
                    Ok(issue) => issue,
                    Err(error) => {
                        eprintln!(
                            "issue command failed: repo={owner}/{repo} number={number} error={error:#}"
                        );
                        return self.notify(ctx, "Error fetching the issue from GitHub").await;
                    }
                };
                let attachments = issue
                    .body
                    .as_deref()
                    .map(extract_image_urls)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|image_url| MessageAttachment { image_url })
                    .collect::<Vec<_>>();
                let message = OutboundMessage {
                    text: render_issue_detail(&issue),
                    attachments,
                    ..OutboundMessage::default()
                };
                self.post(ctx, message).await?;
            }
            None => {
                let issues = match client.list_repo_issues(owner, repo, page).await {
                    Ok(issues) => issues,
                    Err(error) => {
                        eprintln!(
                            "issue command failed: repo={owner}/{repo} page={page} error={error:#}"
                        );
                        return self.notify(ctx, "Error fetching issues from GitHub").await;
                    }
                };
                let issues = issues
                    .into_iter()
                    .filter(|issue| issue.pull_request.is_none())
                    .collect::<Vec<_>>();
                if issues.is_empty() {
                    self.notify(
                        ctx,
                        format!("No open issues in `{owner}/{repo}` on page {page}"),
                    )
                    .await?;
                }
                for issue in &issues {
                    self.post(ctx, OutboundMessage::text(render_issue_summary(issue)))
                        .await?;
                }
            }
        }

        self.store
            .store_last_command(
                &ctx.sender.id,
                &ReplayCommand::Issue {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                },
            )
            .await
    }

    async fn handle_create(&self, ctx: &CommandContext, owner: &str, repo: &str) -> Result<()> {
        let Some(trigger_id) = ctx.trigger_id.as_deref() else {
            return self
                .notify(ctx, "The create command needs an interactive trigger")
                .await;
        };

        self.store
            .set_room_selection(
                &ctx.sender.id,
                &serde_json::to_value(&ctx.room).context("failed to encode room selection")?,
            )
            .await?;
        let view = build_issue_compose_view(
            IssueComposeMode::Write,
            "",
            "",
            json!({"owner": owner, "repo": repo, "room_id": ctx.room.id}),
        );
        self.modals.open_view(&ctx.sender, trigger_id, view).await
    }

    /// Advances the compose flow: write submits into preview, preview
    /// submits into issue creation.
    pub async fn handle_issue_compose_submit(
        &self,
        sender: &ChatUser,
        submission: &IssueComposeSubmission,
    ) -> Result<()> {
        match submission.mode {
            IssueComposeMode::Write => {
                let view = build_issue_compose_view(
                    IssueComposeMode::Preview,
                    &submission.title,
                    &submission.description,
                    submission.context.clone(),
                );
                self.modals.update_view(view).await
            }
            IssueComposeMode::Preview => self.submit_issue(sender, submission).await,
        }
    }

    async fn submit_issue(
        &self,
        sender: &ChatUser,
        submission: &IssueComposeSubmission,
    ) -> Result<()> {
        let room = self.compose_room(sender, &submission.context).await?;
        let ctx = CommandContext {
            sender: sender.clone(),
            room,
            trigger_id: None,
        };

        let owner = submission.context["owner"].as_str().unwrap_or_default();
        let repo = submission.context["repo"].as_str().unwrap_or_default();
        if owner.is_empty() || repo.is_empty() {
            return self
                .notify(&ctx, "The compose view lost its repository binding")
                .await;
        }

        let Some(client) = self.authorized_client(&ctx).await? else {
            return Ok(());
        };
        match client
            .create_issue(owner, repo, &submission.title, &submission.description)
            .await
        {
            Ok(issue) => {
                self.notify(
                    &ctx,
                    format!("Created issue #{}: {}", issue.number, issue.html_url),
                )
                .await
            }
            Err(error) => {
                eprintln!("create issue failed: repo={owner}/{repo} error={error:#}");
                self.notify(&ctx, "Error creating the issue on GitHub").await
            }
        }
    }

    async fn handle_subscribe(&self, ctx: &CommandContext, events: &[String]) -> Result<()> {
        let supported = WebhookEventKind::supported()
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>();
        if let Some(unknown) = events
            .iter()
            .find(|event| WebhookEventKind::parse(event).is_none())
        {
            return self
                .notify(
                    ctx,
                    format!(
                        "Unsupported event `{unknown}`. Supported events: {}",
                        supported.join(", ")
                    ),
                )
                .await;
        }

        // Wholesale replace: the new list is the subscription, not a merge.
        self.store
            .set_subscribed_events(&ctx.sender.id, events)
            .await?;
        self.notify(ctx, format!("Subscribed to events: {}", events.join(", ")))
            .await
    }

    async fn handle_disconnect(&self, ctx: &CommandContext, repo_url: &str) -> Result<()> {
        let Some(slug) = parse_repo_slug(repo_url) else {
            return self.notify(ctx, "Invalid GitHub repository address").await;
        };
        if self.store.unlink_repo(&slug.slug()).await? {
            self.notify(ctx, format!("Disconnected `{slug}`")).await
        } else {
            self.notify(ctx, format!("`{slug}` was not connected")).await
        }
    }

    /// Builds a client bound to the invoking user's stored token, or sends
    /// the set-token remediation and yields None.
    async fn authorized_client(&self, ctx: &CommandContext) -> Result<Option<GithubApiClient>> {
        let Some(token) = self.store.access_token(&ctx.sender.id).await? else {
            self.notify(ctx, SET_TOKEN_REMEDIATION).await?;
            return Ok(None);
        };
        Ok(Some(GithubApiClient::new(
            &self.config.github_api_base,
            &token,
            self.config.request_timeout_ms,
        )?))
    }

    async fn compose_room(
        &self,
        sender: &ChatUser,
        context: &serde_json::Value,
    ) -> Result<Room> {
        if let Some(stored) = self.store.room_selection(&sender.id).await? {
            if let Ok(room) = serde_json::from_value::<Room>(stored) {
                return Ok(room);
            }
        }
        Ok(Room {
            id: context["room_id"].as_str().unwrap_or_default().to_string(),
            name: String::new(),
        })
    }

    async fn notify(&self, ctx: &CommandContext, text: impl Into<String>) -> Result<()> {
        self.notifier
            .notify_user(&ctx.sender, &ctx.room, OutboundMessage::text(text.into()))
            .await
    }

    async fn post(&self, ctx: &CommandContext, mut message: OutboundMessage) -> Result<()> {
        if message.alias.is_none() {
            message.alias = Some(self.config.bot_alias.clone());
        }
        self.notifier.post_room_message(&ctx.room, message).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use async_trait::async_trait;
    use httpmock::prelude::*;
    use serde_json::json;

    use hublink_store::{BridgeStore, MemoryAssociationStore, ReplayCommand};

    use super::{CommandContext, CommandDispatcher, IssueComposeSubmission};
    use crate::capabilities::{
        ChatNotifier, ChatUser, ModalPresenter, OutboundMessage, Room,
    };
    use crate::config::BridgeConfig;
    use crate::issue_modal::{IssueComposeMode, ModalView};

    #[derive(Default)]
    struct RecordingNotifier {
        user_notices: Mutex<Vec<String>>,
        room_messages: Mutex<Vec<OutboundMessage>>,
    }

    impl RecordingNotifier {
        fn notices(&self) -> Vec<String> {
            self.user_notices.lock().expect("lock").clone()
        }

        fn messages(&self) -> Vec<OutboundMessage> {
            self.room_messages.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl ChatNotifier for RecordingNotifier {
        async fn post_room_message(&self, _room: &Room, message: OutboundMessage) -> Result<()> {
            self.room_messages.lock().expect("lock").push(message);
            Ok(())
        }

        async fn notify_user(
            &self,
            _user: &ChatUser,
            _room: &Room,
            message: OutboundMessage,
        ) -> Result<()> {
            self.user_notices.lock().expect("lock").push(message.text);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingModals {
        opened: Mutex<Vec<ModalView>>,
        updated: Mutex<Vec<ModalView>>,
    }

    #[async_trait]
    impl ModalPresenter for RecordingModals {
        async fn open_view(
            &self,
            _user: &ChatUser,
            _trigger_id: &str,
            view: ModalView,
        ) -> Result<()> {
            self.opened.lock().expect("lock").push(view);
            Ok(())
        }

        async fn update_view(&self, view: ModalView) -> Result<()> {
            self.updated.lock().expect("lock").push(view);
            Ok(())
        }
    }

    struct Harness {
        dispatcher: CommandDispatcher,
        store: BridgeStore,
        notifier: Arc<RecordingNotifier>,
        modals: Arc<RecordingModals>,
        ctx: CommandContext,
    }

    fn harness(github_base: &str) -> Harness {
        let store = BridgeStore::new(Arc::new(MemoryAssociationStore::new()));
        let notifier = Arc::new(RecordingNotifier::default());
        let modals = Arc::new(RecordingModals::default());
        let mut config = BridgeConfig::new("https://bridge.example/webhook", "subscriber");
        config.github_api_base = github_base.to_string();
        config.request_timeout_ms = 3_000;

        Harness {
            dispatcher: CommandDispatcher::new(
                store.clone(),
                notifier.clone(),
                modals.clone(),
                config,
            ),
            store,
            notifier,
            modals,
            ctx: CommandContext {
                sender: ChatUser {
                    id: "u1".to_string(),
                    username: "tester".to_string(),
                },
                room: Room {
                    id: "room-1".to_string(),
                    name: "#general".to_string(),
                },
                trigger_id: Some("trigger-1".to_string()),
            },
        }
    }

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|token| token.to_string()).collect()
    }

    async fn set_token(harness: &Harness) {
        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["set-token", "ghp_test"]))
            .await
            .expect("set token");
    }

    #[tokio::test]
    async fn functional_connect_registers_hook_links_repo_and_confirms() {
        let server = MockServer::start();
        let hook_mock = server.mock(|when, then| {
            when.method(POST).path("/repos/RocketChat/Rocket.Chat/hooks");
            then.status(201).json_body(json!({"id": 1, "active": true, "events": []}));
        });

        let harness = harness(&server.base_url());
        set_token(&harness).await;
        harness
            .dispatcher
            .dispatch(
                &harness.ctx,
                &args(&["connect", "https://github.com/RocketChat/Rocket.Chat/extra/path"]),
            )
            .await
            .expect("connect");

        hook_mock.assert();
        assert_eq!(
            harness
                .store
                .room_for_repo("RocketChat/Rocket.Chat")
                .await
                .expect("lookup"),
            Some("room-1".to_string())
        );
        let notices = harness.notifier.notices();
        assert!(notices
            .last()
            .expect("notice")
            .contains("Successfully connected `RocketChat/Rocket.Chat`"));
    }

    #[tokio::test]
    async fn regression_connect_rejects_foreign_host_without_registration() {
        let server = MockServer::start();
        let hook_mock = server.mock(|when, then| {
            when.method(POST).path("/repos/foo/bar/hooks");
            then.status(201).json_body(json!({"id": 1}));
        });

        let harness = harness(&server.base_url());
        set_token(&harness).await;
        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["connect", "https://gitlab.com/foo/bar"]))
            .await
            .expect("connect");

        hook_mock.assert_calls(0);
        assert!(harness
            .notifier
            .notices()
            .last()
            .expect("notice")
            .contains("Invalid GitHub repository address"));
        assert_eq!(
            harness.store.room_for_repo("foo/bar").await.expect("lookup"),
            None
        );
    }

    #[tokio::test]
    async fn regression_connect_without_token_sends_remediation() {
        let server = MockServer::start();
        let harness = harness(&server.base_url());
        harness
            .dispatcher
            .dispatch(
                &harness.ctx,
                &args(&["connect", "https://github.com/o/r"]),
            )
            .await
            .expect("connect");

        assert!(harness
            .notifier
            .notices()
            .last()
            .expect("notice")
            .contains("/github set-token"));
    }

    #[tokio::test]
    async fn functional_user_command_posts_repo_lines_and_persists_replay() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/users/alice/repos")
                .query_param("page", "1");
            then.status(200).json_body(json!([
                {"full_name": "alice/first", "html_url": "https://github.com/alice/first"},
                {"full_name": "alice/second", "html_url": "https://github.com/alice/second"}
            ]));
        });

        let harness = harness(&server.base_url());
        set_token(&harness).await;
        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["user", "alice"]))
            .await
            .expect("user command");

        let messages = harness.notifier.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].text.contains("alice/first"));
        assert_eq!(messages[0].alias.as_deref(), Some("git-bot"));
        assert_eq!(
            harness.store.last_command("u1").await.expect("replay slot"),
            Some(ReplayCommand::User {
                username: "alice".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn functional_issue_then_replay_fetches_next_page_with_stored_args() {
        let server = MockServer::start();
        let page_one = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/RocketChat/Rocket.Chat/issues")
                .query_param("page", "1");
            then.status(200).json_body(json!([{
                "number": 1,
                "title": "First",
                "user": {"login": "alice", "html_url": "https://github.com/alice"},
                "state": "open",
                "html_url": "https://github.com/RocketChat/Rocket.Chat/issues/1"
            }]));
        });
        let page_two = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/RocketChat/Rocket.Chat/issues")
                .query_param("page", "2");
            then.status(200).json_body(json!([{
                "number": 9,
                "title": "Ninth",
                "user": {"login": "bob", "html_url": "https://github.com/bob"},
                "state": "open",
                "html_url": "https://github.com/RocketChat/Rocket.Chat/issues/9"
            }]));
        });

        let harness = harness(&server.base_url());
        set_token(&harness).await;
        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["issue", "RocketChat", "Rocket.Chat"]))
            .await
            .expect("issue command");
        page_one.assert();
        assert_eq!(
            harness.store.last_command("u1").await.expect("replay slot"),
            Some(ReplayCommand::Issue {
                owner: "RocketChat".to_string(),
                repo: "Rocket.Chat".to_string(),
            })
        );

        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["/", "2"]))
            .await
            .expect("replay");
        page_two.assert();
        let messages = harness.notifier.messages();
        assert!(messages.last().expect("message").text.contains("#9"));
    }

    #[tokio::test]
    async fn regression_replay_with_empty_slot_is_silent() {
        let server = MockServer::start();
        let harness = harness(&server.base_url());
        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["/", "2"]))
            .await
            .expect("replay must not fail");

        assert!(harness.notifier.notices().is_empty());
        assert!(harness.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn functional_single_issue_renders_detail_with_image_attachments() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/o/r/issues/7");
            then.status(200).json_body(json!({
                "number": 7,
                "title": "Broken build",
                "user": {"login": "bob", "html_url": "https://github.com/bob"},
                "state": "open",
                "created_at": "2024-05-01T10:30:00Z",
                "body": "see ![shot](https://example.com/shot.png)",
                "html_url": "https://github.com/o/r/issues/7"
            }));
        });

        let harness = harness(&server.base_url());
        set_token(&harness).await;
        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["issue", "o", "r", "7"]))
            .await
            .expect("issue command");

        let messages = harness.notifier.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].text.contains("#7 Broken build"));
        assert_eq!(messages[0].attachments.len(), 1);
        assert_eq!(
            messages[0].attachments[0].image_url,
            "https://example.com/shot.png"
        );
    }

    #[tokio::test]
    async fn regression_api_failure_surfaces_generic_notice_not_a_crash() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users/alice/repos");
            then.status(500).body("upstream exploded");
        });

        let harness = harness(&server.base_url());
        set_token(&harness).await;
        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["user", "alice"]))
            .await
            .expect("dispatch survives api failure");

        let notices = harness.notifier.notices();
        let last = notices.last().expect("notice");
        assert!(last.contains("Error fetching repositories"));
        assert!(!last.contains("upstream exploded"));
    }

    #[tokio::test]
    async fn functional_subscribe_replaces_list_and_rejects_unknown_events() {
        let server = MockServer::start();
        let harness = harness(&server.base_url());

        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["subscribe", "issues", "push"]))
            .await
            .expect("subscribe");
        assert_eq!(
            harness.store.subscribed_events("u1").await.expect("events"),
            Some(vec!["issues".to_string(), "push".to_string()])
        );

        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["subscribe", "issue_comment"]))
            .await
            .expect("resubscribe");
        assert_eq!(
            harness.store.subscribed_events("u1").await.expect("events"),
            Some(vec!["issue_comment".to_string()])
        );

        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["subscribe", "gollum"]))
            .await
            .expect("invalid subscribe");
        assert!(harness
            .notifier
            .notices()
            .last()
            .expect("notice")
            .contains("Unsupported event `gollum`"));
        // The rejected list must not have replaced the previous one.
        assert_eq!(
            harness.store.subscribed_events("u1").await.expect("events"),
            Some(vec!["issue_comment".to_string()])
        );
    }

    #[tokio::test]
    async fn functional_disconnect_unlinks_a_connected_repo() {
        let server = MockServer::start();
        let harness = harness(&server.base_url());
        harness
            .store
            .link_repo_to_room("o/r", "room-1")
            .await
            .expect("link");

        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["disconnect", "https://github.com/o/r"]))
            .await
            .expect("disconnect");
        assert_eq!(harness.store.room_for_repo("o/r").await.expect("lookup"), None);
        assert!(harness
            .notifier
            .notices()
            .last()
            .expect("notice")
            .contains("Disconnected `o/r`"));
    }

    #[tokio::test]
    async fn functional_create_opens_modal_and_preview_submit_creates_issue() {
        let server = MockServer::start();
        let create_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/repos/o/r/issues")
                .body_includes("\"title\":\"Broken build\"");
            then.status(201).json_body(json!({
                "number": 11,
                "title": "Broken build",
                "html_url": "https://github.com/o/r/issues/11"
            }));
        });

        let harness = harness(&server.base_url());
        set_token(&harness).await;
        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["create", "o", "r"]))
            .await
            .expect("create command");

        let opened = harness.modals.opened.lock().expect("lock").clone();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].title, "Create Issue/write");
        let context = opened[0].context.clone();
        assert_eq!(context["owner"], "o");

        harness
            .dispatcher
            .handle_issue_compose_submit(
                &harness.ctx.sender,
                &IssueComposeSubmission {
                    mode: IssueComposeMode::Write,
                    title: "Broken build".to_string(),
                    description: "It fails".to_string(),
                    context: context.clone(),
                },
            )
            .await
            .expect("write submit");
        let updated = harness.modals.updated.lock().expect("lock").clone();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].title, "Create Issue/preview");

        harness
            .dispatcher
            .handle_issue_compose_submit(
                &harness.ctx.sender,
                &IssueComposeSubmission {
                    mode: IssueComposeMode::Preview,
                    title: "Broken build".to_string(),
                    description: "It fails".to_string(),
                    context,
                },
            )
            .await
            .expect("preview submit");

        create_mock.assert();
        assert!(harness
            .notifier
            .notices()
            .last()
            .expect("notice")
            .contains("Created issue #11"));
    }

    #[tokio::test]
    async fn unit_help_and_unknown_commands_notify_the_sender() {
        let server = MockServer::start();
        let harness = harness(&server.base_url());

        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["help"]))
            .await
            .expect("help");
        assert!(harness
            .notifier
            .notices()
            .last()
            .expect("notice")
            .contains("/github connect"));

        harness
            .dispatcher
            .dispatch(&harness.ctx, &args(&["search"]))
            .await
            .expect("unknown");
        assert!(harness
            .notifier
            .notices()
            .last()
            .expect("notice")
            .contains("Unknown command `search`"));
    }
}

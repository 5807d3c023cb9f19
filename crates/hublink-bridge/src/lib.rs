//! Core of the Hublink chat ↔ GitHub bridge.
//!
//! Webhook ingress (payload normalization, subscription and room-mapping
//! resolution, event routing, message templating), the slash-command
//! dispatcher with pagination replay, the two-step issue-compose modal flow,
//! and the host capability seams everything is wired through.

pub mod capabilities;
pub mod command_dispatcher;
pub mod commands;
pub mod config;
pub mod issue_modal;
pub mod render;
pub mod webhook_ingress;
pub mod webhook_server;

pub use capabilities::{
    ChatNotifier, ChatUser, MessageAttachment, ModalPresenter, OutboundMessage, Room,
    RoomDirectory,
};
pub use command_dispatcher::{CommandContext, CommandDispatcher, IssueComposeSubmission};
pub use commands::{parse_bridge_command, BridgeCommand};
pub use config::BridgeConfig;
pub use issue_modal::{build_issue_compose_view, IssueComposeMode, ModalBlock, ModalView};
pub use webhook_ingress::{
    WebhookDelivery, WebhookEventKind, WebhookIngress, WebhookOutcome, WebhookSkipReason,
};
pub use webhook_server::{build_webhook_router, serve_webhook, WebhookServerState};

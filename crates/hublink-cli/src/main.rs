//! Hublink runner: wires the file-backed store and console host adapters,
//! then serves the webhook endpoint until ctrl-c.

mod cli_args;
mod host_adapters;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use hublink_bridge::{
    serve_webhook, BridgeConfig, WebhookIngress, WebhookServerState,
};
use hublink_core::JsonlEventLog;
use hublink_store::{BridgeStore, FileAssociationStore};

use cli_args::CliArgs;
use host_adapters::{ConsoleNotifier, PassthroughRoomDirectory};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let kv = Arc::new(FileAssociationStore::load(args.state_file.clone())?);
    let store = BridgeStore::new(kv);
    // Record the webhook subscriber binding so hosts reading the store see
    // who gates ingress.
    store
        .set_user_selection(&serde_json::json!({"id": args.subscriber}))
        .await?;

    let mut config = BridgeConfig::new(args.callback_url.clone(), args.subscriber.clone());
    config.github_api_base = args.github_api_base.clone();
    config.request_timeout_ms = args.request_timeout_ms;
    config.bot_alias = args.bot_alias.clone();
    config.webhook_secret = args.webhook_secret.clone();

    let diagnostics = match args.diagnostics_log.as_ref() {
        Some(path) => Some(JsonlEventLog::open(path.clone())?),
        None => None,
    };

    let state = Arc::new(WebhookServerState {
        ingress: WebhookIngress::new(
            store,
            Arc::new(PassthroughRoomDirectory),
            Arc::new(ConsoleNotifier),
            config.subscriber_user_id.clone(),
            config.bot_alias.clone(),
        ),
        webhook_secret: config.webhook_secret.clone(),
        diagnostics,
    });

    println!(
        "hublink starting: state_file={} subscriber={} callback_url={}",
        args.state_file.display(),
        config.subscriber_user_id,
        config.webhook_callback_url
    );
    serve_webhook(&args.bind, state).await
}

//! HTTP surface for webhook ingress.
//!
//! The endpoint always acknowledges with 200: GitHub treats non-2xx as a
//! delivery failure, retries, and eventually disables the hook, so internal
//! misses must never leak into the response. Outcomes land in the JSONL
//! diagnostics log instead.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tokio::net::TcpListener;

use hublink_core::{current_unix_timestamp_ms, JsonlEventLog};

use crate::webhook_ingress::{WebhookDelivery, WebhookIngress, WebhookOutcome, GITHUB_EVENT_HEADER};

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

pub struct WebhookServerState {
    pub ingress: WebhookIngress,
    /// Shared secret for `X-Hub-Signature-256`; None disables verification.
    pub webhook_secret: Option<String>,
    pub diagnostics: Option<JsonlEventLog>,
}

pub fn build_webhook_router(state: Arc<WebhookServerState>) -> Router {
    Router::new()
        .route("/webhook", post(handle_github_webhook))
        .route("/healthz", get(handle_health))
        .with_state(state)
}

/// Binds and serves the webhook router until ctrl-c.
pub async fn serve_webhook(bind_addr: &str, state: Arc<WebhookServerState>) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve webhook bound address")?;
    println!("hublink webhook server listening: addr={local_addr}");

    let app = build_webhook_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("webhook server exited unexpectedly")
}

async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn handle_github_webhook(
    State(state): State<Arc<WebhookServerState>>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let event = header_value(&headers, GITHUB_EVENT_HEADER);

    if let Some(secret) = state.webhook_secret.as_deref() {
        let signature = header_value(&headers, SIGNATURE_HEADER);
        if verify_sha256_hmac_signature(body.as_bytes(), &signature, secret).is_err() {
            diagnose(
                &state,
                &event,
                json!({"outcome": "ignored", "reason": "signature_mismatch"}),
            );
            return acknowledge("ignored", Some("signature_mismatch"));
        }
    }

    let delivery = WebhookDelivery {
        event: event.clone(),
        content_type: header_value(&headers, "content-type"),
        body,
    };
    match state.ingress.handle_delivery(&delivery).await {
        Ok(WebhookOutcome::Delivered { event: kind, room_id }) => {
            diagnose(
                &state,
                &event,
                json!({"outcome": "delivered", "event": kind.as_str(), "room_id": room_id}),
            );
            acknowledge("delivered", None)
        }
        Ok(WebhookOutcome::Skipped { reason, detail }) => {
            diagnose(
                &state,
                &event,
                json!({"outcome": "ignored", "reason": reason.as_str(), "detail": detail}),
            );
            acknowledge("ignored", Some(reason.as_str()))
        }
        Err(error) => {
            eprintln!("webhook ingress failure: event={event} error={error:#}");
            diagnose(
                &state,
                &event,
                json!({"outcome": "ignored", "reason": "internal_error", "detail": error.to_string()}),
            );
            acknowledge("ignored", Some("internal_error"))
        }
    }
}

fn acknowledge(status: &str, reason: Option<&str>) -> (StatusCode, Json<serde_json::Value>) {
    let mut payload = json!({"status": status});
    if let Some(reason) = reason {
        payload["reason"] = json!(reason);
    }
    (StatusCode::OK, Json(payload))
}

fn diagnose(state: &WebhookServerState, event: &str, mut record: serde_json::Value) {
    let Some(log) = state.diagnostics.as_ref() else {
        return;
    };
    record["event_header"] = json!(event);
    record["unix_ms"] = json!(current_unix_timestamp_ms());
    if let Err(error) = log.append(&record) {
        eprintln!("failed to append webhook diagnostic: {error:#}");
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

fn verify_sha256_hmac_signature(payload: &[u8], signature_header: &str, secret: &str) -> Result<()> {
    let digest_hex = signature_header
        .strip_prefix("sha256=")
        .ok_or_else(|| anyhow!("signature must use sha256=<hex> format"))?;
    let signature_bytes = decode_hex(digest_hex)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .context("failed to initialize hmac verifier")?;
    mac.update(payload);
    mac.verify_slice(&signature_bytes)
        .map_err(|_| anyhow!("signature verification failed"))
}

fn decode_hex(raw: &str) -> Result<Vec<u8>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("signature digest cannot be empty");
    }
    if trimmed.len() % 2 != 0 {
        bail!("signature digest must have an even number of hex characters");
    }
    let mut bytes = Vec::with_capacity(trimmed.len() / 2);
    let mut index = 0usize;
    while index < trimmed.len() {
        let chunk = &trimmed[index..index + 2];
        let byte = u8::from_str_radix(chunk, 16)
            .with_context(|| format!("invalid hex byte '{}' in signature digest", chunk))?;
        bytes.push(byte);
        index += 2;
    }
    Ok(bytes)
}

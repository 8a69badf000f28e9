//! Gateway HTTP server: health probe and the LINE webhook.

use crate::chain::ResponderChain;
use crate::channels::{
    verify_signature, ChannelHandle, InboundMessage, LineChannel, LineWebhook,
    LINE_SIGNATURE_HEADER,
};
use crate::config::{self, Config};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Inbound queue depth between the webhook handler and the dispatcher.
const INBOUND_QUEUE: usize = 64;

/// Shared state for the gateway. Everything here is read-only after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub chain: Arc<ResponderChain>,
    /// Channel used to deliver replies.
    pub channel: Arc<dyn ChannelHandle>,
    /// Secret for X-Line-Signature verification.
    pub channel_secret: Arc<str>,
    /// Sender for inbound channel messages. The processor task receives and dispatches.
    pub inbound_tx: mpsc::Sender<InboundMessage>,
}

/// Dispatch one inbound message through the chain and deliver the reply, if any.
async fn process_inbound_message(
    chain: Arc<ResponderChain>,
    channel: Arc<dyn ChannelHandle>,
    msg: InboundMessage,
) {
    let msg_id = format!("msg-{}", uuid::Uuid::new_v4());
    log::info!(
        "{}: inbound from {} ({} chars)",
        msg_id,
        msg.channel_id,
        msg.text.chars().count()
    );
    let Some(reply) = chain.dispatch(&msg.text).await else {
        log::info!("{}: no responder answered, nothing sent", msg_id);
        return;
    };
    match channel.send_reply(&msg.reply_token, &reply.text).await {
        Ok(()) => log::debug!("{}: reply sent", msg_id),
        Err(e) => log::warn!("{}: send_reply failed: {}", msg_id, e),
    }
}

/// Spawn the processor: each queued message is handled on its own task.
fn spawn_processor(
    chain: Arc<ResponderChain>,
    channel: Arc<dyn ChannelHandle>,
    mut inbound_rx: mpsc::Receiver<InboundMessage>,
) {
    tokio::spawn(async move {
        while let Some(msg) = inbound_rx.recv().await {
            tokio::spawn(process_inbound_message(chain.clone(), channel.clone(), msg));
        }
        log::debug!("inbound queue closed, processor stopping");
    });
}

/// Build the router over an existing state. Exposed so callers can embed the routes.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/callback", post(line_webhook))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Fails before serving when the generation service or LINE credentials are not configured.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    config::require_ready(&config)?;
    let access_token = config::resolve_line_access_token(&config)
        .context("LINE channel access token not configured")?;
    let channel_secret = config::resolve_line_channel_secret(&config)
        .context("LINE channel secret not configured")?;

    let chain = Arc::new(ResponderChain::from_config(&config));
    let channel: Arc<dyn ChannelHandle> = Arc::new(LineChannel::new(
        access_token,
        config.channels.line.api_base.clone(),
    ));
    log::info!("channel {} ready", channel.id());

    let (inbound_tx, inbound_rx) = mpsc::channel::<InboundMessage>(INBOUND_QUEUE);
    spawn_processor(chain.clone(), channel.clone(), inbound_rx);

    let state = GatewayState {
        config: Arc::new(config.clone()),
        chain,
        channel,
        channel_secret: Arc::from(channel_secret),
        inbound_tx,
    };

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /callback — LINE webhook. Verifies X-Line-Signature, queues each text message, answers 200 "OK".
async fn line_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let signature = headers
        .get(LINE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !verify_signature(&state.channel_secret, &body, signature) {
        log::warn!("line webhook: invalid signature");
        return (StatusCode::BAD_REQUEST, "invalid signature");
    }
    let hook: LineWebhook = match serde_json::from_slice(&body) {
        Ok(h) => h,
        Err(e) => {
            log::debug!("line webhook: bad payload: {}", e);
            return (StatusCode::BAD_REQUEST, "bad payload");
        }
    };
    for inbound in hook.text_messages(state.channel.id()) {
        if state.inbound_tx.send(inbound).await.is_err() {
            return (StatusCode::SERVICE_UNAVAILABLE, "unavailable");
        }
    }
    (StatusCode::OK, "OK")
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
        "responders": state.chain.names(),
        "policy": state.chain.policy(),
    }))
}

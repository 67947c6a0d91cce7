//! HTTP webhook listener.
//!
//! `POST /hook` accepts forge deliveries and `GET /health` answers liveness
//! probes. Accepted events are handled on their own task so the forge gets
//! its `202` without waiting on label edits.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::dispatcher::Dispatcher;
use super::{InboundEvent, EVENT_HEADER, TOKEN_HEADER};
use crate::{AppError, Result};

/// Shared state for the webhook routes.
pub struct WebhookState {
    /// Event router.
    pub dispatcher: Arc<Dispatcher>,
    /// Expected `X-Gitee-Token` value; empty disables the check.
    pub webhook_secret: String,
}

/// Handler for `GET /health`.
async fn health() -> &'static str {
    "ok"
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Handler for `POST /hook`.
async fn receive(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if !state.webhook_secret.is_empty()
        && header_str(&headers, TOKEN_HEADER) != Some(state.webhook_secret.as_str())
    {
        warn!("webhook delivery with missing or wrong token rejected");
        return StatusCode::UNAUTHORIZED;
    }

    let Some(kind) = header_str(&headers, EVENT_HEADER) else {
        warn!("webhook delivery without event header");
        return StatusCode::BAD_REQUEST;
    };

    let event = match InboundEvent::decode(kind, &body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!(kind, "ignoring unhandled event kind");
            return StatusCode::ACCEPTED;
        }
        Err(err) => {
            warn!(kind, %err, "malformed webhook payload");
            return StatusCode::BAD_REQUEST;
        }
    };

    let dispatcher = Arc::clone(&state.dispatcher);
    tokio::spawn(async move {
        if let Err(err) = dispatcher.dispatch(&event).await {
            error!(%err, "event handling failed");
        }
    });

    StatusCode::ACCEPTED
}

/// Build the webhook router.
#[must_use]
pub fn router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/hook", post(receive))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve the webhook router on `listener` until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Io` if the server fails.
pub async fn serve_on(
    listener: TcpListener,
    state: Arc<WebhookState>,
    ct: CancellationToken,
) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "webhook listener started");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Io(format!("webhook server error: {err}")))?;

    info!("webhook listener shut down");
    Ok(())
}

/// Bind `0.0.0.0:port` and serve until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Config` if the port cannot be bound.
pub async fn serve(port: u16, state: Arc<WebhookState>, ct: CancellationToken) -> Result<()> {
    let bind = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind webhook listener on {bind}: {err}")))?;
    serve_on(listener, state, ct).await
}

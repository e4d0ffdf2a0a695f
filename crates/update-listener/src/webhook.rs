//! Telegram webhook endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use orchestrator::spawn_supervised;
use telegram_client::Update;
use tracing::{debug, info, warn};

use crate::dispatcher::UpdateDispatcher;

/// Header carrying the secret registered with `setWebhook`.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Largest accepted update body.
pub const MAX_UPDATE_BYTES: usize = 2 * 1024 * 1024;

/// Shared state of the webhook handler.
#[derive(Clone)]
pub struct WebhookState {
    dispatcher: Arc<UpdateDispatcher>,
    secret: Option<Arc<str>>,
}

impl WebhookState {
    /// A blank `secret` disables the header check.
    pub fn new(dispatcher: Arc<UpdateDispatcher>, secret: Option<String>) -> Self {
        let secret = secret
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(Arc::from);
        Self { dispatcher, secret }
    }
}

/// Build the router serving Telegram updates at `path` (POST only).
pub fn webhook_router(path: &str, state: WebhookState) -> Router {
    Router::new()
        .route(path, post(receive_update))
        .layer(DefaultBodyLimit::max(MAX_UPDATE_BYTES))
        .with_state(state)
}

/// Accept an update and handle it in the background.
///
/// Telegram only needs a quick 200; the actual work never blocks the reply.
async fn receive_update(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(expected) = &state.secret {
        let provided = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if provided != expected.as_ref() {
            warn!("Webhook request with missing or wrong secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            debug!("Undecodable webhook body: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    info!(update_id = update.update_id, "Telegram update received");
    let dispatcher = Arc::clone(&state.dispatcher);
    spawn_supervised("update", async move {
        let outcome = dispatcher.dispatch(update).await;
        debug!(?outcome, "Update dispatched");
    });

    StatusCode::OK
}

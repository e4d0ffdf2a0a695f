//! Inbound side of the Karakeep Telegram bot.
//!
//! - [`UpdateDispatcher`] - Routes a decoded update to the command handler,
//!   the album collector or a new pipeline batch
//! - [`webhook_router`] - The axum endpoint Telegram posts updates to
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use update_listener::{webhook_router, UpdateDispatcher, WebhookState};
//!
//! let dispatcher = Arc::new(UpdateDispatcher::new(pipeline, store, telegram, "0.1.0", delay));
//! let app = webhook_router("/telegram/webhook", WebhookState::new(dispatcher, secret));
//! axum::serve(listener, app).await?;
//! ```

mod dispatcher;
mod webhook;

pub use dispatcher::{Dispatch, UpdateDispatcher};
pub use webhook::{webhook_router, WebhookState, MAX_UPDATE_BYTES, SECRET_HEADER};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Telegram Bot API client library.
//!
//! This crate provides a Rust client for the subset of the Telegram Bot API
//! used by the Karakeep bot. It supports:
//!
//! - Sending and editing text messages
//! - Downloading files with a byte ceiling
//! - Registering a webhook
//! - Decoding webhook updates and converting them into [`keep_core::MessageUnit`]s
//!
//! # Example
//!
//! ```no_run
//! use telegram_client::{BotConfig, TelegramClient};
//!
//! # async fn example() -> Result<(), telegram_client::TelegramError> {
//! let client = TelegramClient::new(BotConfig::new("123:ABC"))?;
//!
//! let sent = client.send_message(42, "⏳ Saving…").await?;
//! client.edit_message_text(42, sent.message_id, "✅ Saved").await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod types;

pub use client::{truncate_message, TelegramClient, MAX_MESSAGE_CHARS};
pub use config::BotConfig;
pub use convert::MessageExt;
pub use error::TelegramError;
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Batch processing for the Karakeep Telegram bot.
//!
//! This crate turns classified messages into saved bookmarks:
//!
//! - [`Pipeline`] - Saves one batch and keeps the user's acknowledgment
//!   message up to date until a summary arrives
//! - [`MediaGroupCollector`] - Debounces album members into one batch
//! - [`PollingWaiter`] - Interval polling with a timeout and shutdown signal
//! - [`CommandHandler`] - `/server`, `/key` and the other setup commands
//!
//! # Architecture
//!
//! ```text
//! MessageUnit(s) → Batch
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        PIPELINE                             │
//! │                                                             │
//! │  1. Load server + API key (reply "not configured" if none)  │
//! │  2. Classify: bookmark / note / file                        │
//! │  3. Send "⏳ Saving…" acknowledgment                        │
//! │  4. Create the bookmark                                     │
//! │  5. Download, upload and attach each attachment             │
//! │  6. Edit acknowledgment: "✅ Saved (id=…)"                   │
//! │  7. Bookmarks only: poll until content is extracted         │
//! │  8. Poll summarize + get until a summary appears            │
//! │  9. Edit acknowledgment with title, summary and tags        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keep_core::{Batch, MessageUnit};
//! use orchestrator::Pipeline;
//!
//! let pipeline = Arc::new(Pipeline::new(telegram.clone(), telegram, connector, store));
//! let unit = MessageUnit::text(42, 42, "https://example.com", 1_700_000_000);
//! pipeline.spawn_batch(Batch::single(unit));
//! ```

mod attachments;
mod commands;
mod error;
pub mod formatting;
mod media_group;
mod pipeline;
mod polling;
mod readiness;
mod server_url;
mod task;

pub use attachments::{extract_attachments, safe_filename};
pub use commands::{CommandHandler, HELP_TEXT, PRIVATE_ONLY, UNKNOWN_COMMAND};
pub use error::PipelineError;
pub use media_group::{FlushFn, MediaGroupCollector, DEFAULT_MEDIA_GROUP_DELAY};
pub use pipeline::{BatchOutcome, Pipeline, PipelineConfig, DEFAULT_MAX_UPLOAD_BYTES};
pub use polling::{PollConfig, PollingWaiter};
pub use readiness::{has_extracted_content, looks_empty_summary, ready_summary, ContentSignal};
pub use server_url::{
    is_disallowed_ip, parse_server_url, validate_server_url, ParsedServerUrl, ServerUrlError,
};
pub use task::spawn_supervised;

// Re-export so callers can build batches without naming keep-core
pub use keep_core::{Batch, MessageUnit};

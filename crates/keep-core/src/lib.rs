//! Core types and collaborator traits for the Karakeep Telegram bot.
//!
//! This crate provides the shared vocabulary of the ingestion pipeline:
//!
//! - [`MessageUnit`] / [`Batch`] - Platform-neutral inbound messages and the
//!   logical submissions built from them
//! - [`Attachment`] - A reference to one downloadable media object
//! - [`BookmarkRecord`] / [`Asset`] - The remote service's view of a save
//! - [`Acknowledger`], [`FileSource`], [`BookmarkApi`], [`BookmarkConnector`],
//!   [`UserStore`] - The collaborator seams the orchestrator drives
//!
//! # Example
//!
//! ```rust
//! use keep_core::{Batch, MessageUnit};
//!
//! let unit = MessageUnit::text(42, 7, "https://example.com", 1_700_000_000);
//! let batch = Batch::single(unit);
//! assert_eq!(batch.representative().text, "https://example.com");
//! ```

mod attachment;
mod error;
mod message;
mod record;
mod settings;
mod traits;

pub use attachment::Attachment;
pub use error::{ApiError, StoreError, TransportError};
pub use message::{
    Batch, Command, Entity, EntityKind, MediaFile, MediaPayload, MessageUnit, Sticker,
};
pub use record::{Asset, BookmarkRecord, NewBookmark, Tag};
pub use settings::UserSettings;
pub use traits::{
    Acknowledger, BookmarkApi, BookmarkConnector, DownloadedFile, FileSource, UserStore,
};

// Re-export async_trait for implementors
pub use async_trait::async_trait;

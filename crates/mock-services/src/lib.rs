//! Mock collaborators for exercising the ingestion pipeline without network
//! or disk access.
//!
//! - [`MockAcknowledger`] - Records sent and edited acknowledgment texts
//! - [`MockFileSource`] - Serves file bytes from memory
//! - [`MockBookmarkApi`] / [`MockConnector`] - A scripted bookmarking service
//! - [`InMemoryUserStore`] - User settings in a map
//!
//! # Example
//!
//! ```rust
//! use keep_core::Acknowledger;
//! use mock_services::MockAcknowledger;
//!
//! #[tokio::main]
//! async fn main() {
//!     let ack = MockAcknowledger::new();
//!     let id = ack.send(1, "⏳ Saving…").await.unwrap();
//!     ack.edit(1, id, "✅ Saved").await.unwrap();
//!     assert_eq!(ack.final_text(id).await.as_deref(), Some("✅ Saved"));
//! }
//! ```

mod acknowledger;
mod bookmarks;
mod files;
mod store;

pub use acknowledger::{AckEvent, MockAcknowledger};
pub use bookmarks::{ApiCall, MockBookmarkApi, MockConnector, Scripted};
pub use files::MockFileSource;
pub use store::InMemoryUserStore;

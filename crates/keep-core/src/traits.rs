//! Collaborator traits driven by the orchestrator.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ApiError, StoreError, TransportError};
use crate::record::{Asset, BookmarkRecord, NewBookmark};
use crate::settings::UserSettings;

/// Sends and edits the user-visible acknowledgment message.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Send `text` to `chat_id`, returning the new message id.
    async fn send(&self, chat_id: i64, text: &str) -> Result<i64, TransportError>;

    /// Replace the text of a previously sent message.
    async fn edit(&self, chat_id: i64, message_id: i64, text: &str) -> Result<(), TransportError>;
}

/// Bytes of a file fetched from the chat platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadedFile {
    pub bytes: Vec<u8>,
    /// Platform-side path of the file, used as a filename fallback.
    pub source_path: String,
}

/// Retrieves media bytes from the chat platform.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Download a file, failing with [`TransportError::TooLarge`] past `max_bytes`.
    async fn download(&self, file_id: &str, max_bytes: u64) -> Result<DownloadedFile, TransportError>;
}

/// The remote bookmarking service, bound to one user's server and credential.
#[async_trait]
pub trait BookmarkApi: Send + Sync {
    async fn create(&self, request: NewBookmark) -> Result<BookmarkRecord, ApiError>;

    async fn upload(&self, data: Vec<u8>, filename: &str, mime: &str) -> Result<Asset, ApiError>;

    async fn attach(&self, bookmark_id: &str, asset_id: &str) -> Result<(), ApiError>;

    /// Ask the service to (re)generate the summary.
    async fn summarize(&self, bookmark_id: &str) -> Result<BookmarkRecord, ApiError>;

    async fn get(&self, bookmark_id: &str) -> Result<BookmarkRecord, ApiError>;
}

/// Builds a [`BookmarkApi`] for a user's server and credential.
pub trait BookmarkConnector: Send + Sync {
    fn connect(&self, server_url: &str, api_key: &str) -> Result<Arc<dyn BookmarkApi>, ApiError>;
}

/// Per-user endpoint and credential storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create the user row if it does not exist yet.
    async fn ensure_user(&self, user_id: i64) -> Result<(), StoreError>;

    /// Load a user's settings with the credential decrypted.
    async fn get_user(&self, user_id: i64) -> Result<Option<UserSettings>, StoreError>;

    async fn set_server_url(&self, user_id: i64, server_url: &str) -> Result<(), StoreError>;

    async fn set_api_key(&self, user_id: i64, api_key: &str) -> Result<(), StoreError>;

    /// Remember the last bookmark saved successfully for this user.
    async fn record_success(&self, user_id: i64, bookmark_id: &str) -> Result<(), StoreError>;
}

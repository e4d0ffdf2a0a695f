//! Error types for karakeep-client.

use keep_core::ApiError;
use thiserror::Error;

/// Errors from the Karakeep API client.
#[derive(Debug, Error)]
pub enum KarakeepError {
    /// The server URL or API key is unusable.
    #[error("{0}")]
    Config(String),

    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("karakeep api error: status={status} body_preview={preview:?}")]
    Status { status: u16, preview: String },

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response body was unusable.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl KarakeepError {
    /// HTTP status of the failure, or 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            KarakeepError::Status { status, .. } => *status,
            _ => 0,
        }
    }
}

impl From<KarakeepError> for ApiError {
    fn from(err: KarakeepError) -> Self {
        match err {
            KarakeepError::Status { status, preview } => ApiError::Status { status, preview },
            KarakeepError::Config(msg) => ApiError::Config(msg),
            KarakeepError::Http(e) => ApiError::Transport(e.to_string()),
            KarakeepError::Json(e) => ApiError::Decode(e.to_string()),
            KarakeepError::Decode(msg) => ApiError::Decode(msg),
        }
    }
}

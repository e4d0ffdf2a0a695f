//! Error types shared by the collaborator traits.

use thiserror::Error;

/// Errors from the chat transport (acknowledgments and file retrieval).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be completed.
    #[error("request failed: {0}")]
    Request(String),

    /// The platform answered with an error.
    #[error("platform error {code}: {description}")]
    Platform { code: i64, description: String },

    /// The file exceeds the configured byte ceiling.
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    /// The platform response was missing required data.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors from the remote bookmarking service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success HTTP status.
    #[error("karakeep api error: status={status} body_preview={preview:?}")]
    Status { status: u16, preview: String },

    /// The request never produced an HTTP response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The client could not be built from the stored settings.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status of the failure, or 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Status { status, .. } => *status,
            _ => 0,
        }
    }
}

/// Errors from the per-user settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage failed.
    #[error("storage error: {0}")]
    Backend(String),

    /// A stored credential could not be decrypted.
    #[error("credential decryption failed: {0}")]
    Crypto(String),

    /// The value is not acceptable for storage.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

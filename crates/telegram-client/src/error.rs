//! Error types for telegram-client.

use keep_core::TransportError;
use thiserror::Error;

/// Errors that can occur when talking to the Bot API.
///
/// HTTP errors never carry the request URL, since it embeds the bot token.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The Bot API answered with `ok: false`.
    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },

    /// The Bot API answered `ok: true` without a result.
    #[error("no result in response to {0}")]
    MissingResult(String),

    /// The file exceeds the allowed size.
    #[error("file too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    /// The file endpoint answered with a non-success status.
    #[error("telegram file download failed: status={0}")]
    DownloadFailed(u16),

    /// The file metadata was unusable.
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<TelegramError> for TransportError {
    fn from(err: TelegramError) -> Self {
        match err {
            TelegramError::Api { code, description } => {
                TransportError::Platform { code, description }
            }
            TelegramError::FileTooLarge { size, limit } => TransportError::TooLarge { size, limit },
            TelegramError::MissingResult(_) | TelegramError::InvalidFile(_) => {
                TransportError::InvalidResponse(err.to_string())
            }
            other => TransportError::Request(other.to_string()),
        }
    }
}

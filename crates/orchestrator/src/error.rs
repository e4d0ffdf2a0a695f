//! Error types for batch processing.

use keep_core::{ApiError, StoreError, TransportError};
use thiserror::Error;

use crate::formatting;

/// Reasons a batch stopped before completing.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The user has no server or API key stored.
    #[error("user {0} is not configured")]
    NotConfigured(i64),

    /// Settings could not be loaded.
    #[error("settings lookup failed: {0}")]
    Settings(#[from] StoreError),

    /// The acknowledgment could not be sent.
    #[error("acknowledgment failed: {0}")]
    Acknowledge(TransportError),

    /// A client for the user's server could not be built.
    #[error("connect failed: {0}")]
    Connect(ApiError),

    /// The bookmark could not be created.
    #[error("create failed: {0}")]
    Create(ApiError),

    /// An attachment exceeds the upload ceiling.
    #[error("attachment {filename} too large: {size} bytes (limit {limit})")]
    TooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },

    /// An attachment could not be fetched from the chat platform.
    #[error("download of {filename} failed: {source}")]
    Download {
        filename: String,
        source: TransportError,
    },

    /// An attachment could not be uploaded.
    #[error("upload failed: {0}")]
    Upload(ApiError),

    /// The upload succeeded but returned no asset id.
    #[error("upload returned an empty asset id")]
    EmptyAssetId,

    /// The uploaded asset could not be attached.
    #[error("attach failed: {0}")]
    Attach(ApiError),
}

impl PipelineError {
    /// The text shown to the user for this failure.
    ///
    /// `None` when the user cannot be told anything, either because no
    /// acknowledgment exists or because the failure is internal.
    pub fn user_message(&self) -> Option<String> {
        match self {
            PipelineError::NotConfigured(_) => Some(formatting::NOT_CONFIGURED.to_string()),
            PipelineError::Settings(_) | PipelineError::Acknowledge(_) => None,
            PipelineError::Connect(e) => Some(formatting::config_error(e)),
            PipelineError::Create(e) => Some(formatting::user_facing_api_error(e)),
            PipelineError::TooLarge {
                filename,
                size,
                limit,
            } => Some(formatting::file_too_large(filename, *size, *limit)),
            PipelineError::Download { source, .. } => Some(formatting::download_failed(source)),
            PipelineError::Upload(e) => Some(formatting::upload_failed(e)),
            PipelineError::EmptyAssetId => Some(formatting::EMPTY_ASSET_ID.to_string()),
            PipelineError::Attach(e) => Some(formatting::attach_failed(e)),
        }
    }
}

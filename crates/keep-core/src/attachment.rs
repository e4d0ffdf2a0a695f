//! Attachment references.

use serde::{Deserialize, Serialize};

/// A reference to one downloadable media object (not its bytes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Opaque platform file identifier.
    pub file_id: String,
    /// Best-effort filename, always a bare path component.
    pub filename: String,
    /// Best-effort MIME type, empty when unknown.
    pub mime: String,
    /// Declared size in bytes, 0 when unknown.
    pub size_bytes: u64,
}

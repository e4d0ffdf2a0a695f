//! Per-user settings as seen by the pipeline.

use chrono::{DateTime, Utc};

/// Stored configuration for one chat user, with the credential already decrypted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSettings {
    pub user_id: i64,
    /// Base URL of the user's bookmarking server.
    pub server_url: Option<String>,
    /// Decrypted API key.
    pub api_key: Option<String>,
    pub last_success_id: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl UserSettings {
    /// Server URL and API key, when both are present and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let server = self.server_url.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let key = self.api_key.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((server, key))
    }
}

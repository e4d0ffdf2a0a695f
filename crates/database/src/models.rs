//! Database models.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A row of the `users` table, with the API key still encrypted.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRow {
    /// Telegram user id.
    pub telegram_user_id: i64,
    /// Normalized Karakeep origin, empty when not set.
    pub server_base_url: String,
    /// `base64(nonce || sealed)`, empty when not set.
    pub api_key_ciphertext: String,
    /// RFC 3339 timestamps.
    pub created_at: String,
    pub updated_at: String,
    pub last_success_at: Option<String>,
    pub last_success_id: Option<String>,
}

impl UserRow {
    /// Parsed `last_success_at`, ignoring unparseable values.
    pub fn last_success_time(&self) -> Option<DateTime<Utc>> {
        self.last_success_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
    }
}

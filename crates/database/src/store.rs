//! [`UserStore`] backed by SQLite with encrypted API keys.

use async_trait::async_trait;
use keep_core::{StoreError, UserSettings, UserStore};

use crate::crypto::SecretBox;
use crate::error::DatabaseError;
use crate::user;
use crate::Database;

/// Per-user settings store.
#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    db: Database,
    secret: SecretBox,
}

impl SqliteUserStore {
    pub fn new(db: Database, secret: SecretBox) -> Self {
        Self { db, secret }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn ensure_user(&self, user_id: i64) -> Result<(), StoreError> {
        Ok(user::upsert_user(self.db.pool(), user_id).await?)
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<UserSettings>, StoreError> {
        let Some(row) = user::get_user(self.db.pool(), user_id).await? else {
            return Ok(None);
        };

        let api_key = if row.api_key_ciphertext.trim().is_empty() {
            None
        } else {
            let key = self
                .secret
                .decrypt(&row.api_key_ciphertext)
                .map_err(DatabaseError::from)?;
            Some(key)
        };
        let server_url = Some(row.server_base_url.trim().to_string()).filter(|s| !s.is_empty());

        Ok(Some(UserSettings {
            user_id,
            server_url,
            api_key,
            last_success_at: row.last_success_time(),
            last_success_id: row.last_success_id,
        }))
    }

    async fn set_server_url(&self, user_id: i64, server_url: &str) -> Result<(), StoreError> {
        Ok(user::set_server_base_url(self.db.pool(), user_id, server_url).await?)
    }

    async fn set_api_key(&self, user_id: i64, api_key: &str) -> Result<(), StoreError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(DatabaseError::Empty("api key").into());
        }
        let sealed = self.secret.encrypt(api_key).map_err(DatabaseError::from)?;
        Ok(user::set_api_key_ciphertext(self.db.pool(), user_id, &sealed).await?)
    }

    async fn record_success(&self, user_id: i64, bookmark_id: &str) -> Result<(), StoreError> {
        Ok(user::set_last_success(self.db.pool(), user_id, bookmark_id).await?)
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use keep_core::{StoreError, UserSettings, UserStore};
use tokio::sync::Mutex;

/// User settings kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<i64, UserSettings>>,
    failing: bool,
    unreadable_key: bool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding one user with the given server and key.
    pub fn configured(user_id: i64, server_url: &str, api_key: &str) -> Self {
        Self::new().with_user(UserSettings {
            user_id,
            server_url: Some(server_url.to_string()),
            api_key: Some(api_key.to_string()),
            ..Default::default()
        })
    }

    pub fn with_user(mut self, settings: UserSettings) -> Self {
        self.users.get_mut().insert(settings.user_id, settings);
        self
    }

    /// A store whose every operation fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Stored keys no longer decrypt, as after a master key change.
    pub fn with_unreadable_key(mut self) -> Self {
        self.unreadable_key = true;
        self
    }

    /// Current settings of a user, without going through the trait.
    pub async fn snapshot(&self, user_id: i64) -> Option<UserSettings> {
        self.users.lock().await.get(&user_id).cloned()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Backend("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn ensure_user(&self, user_id: i64) -> Result<(), StoreError> {
        self.check()?;
        self.users
            .lock()
            .await
            .entry(user_id)
            .or_insert_with(|| UserSettings {
                user_id,
                ..Default::default()
            });
        Ok(())
    }

    async fn get_user(&self, user_id: i64) -> Result<Option<UserSettings>, StoreError> {
        self.check()?;
        if self.unreadable_key {
            return Err(StoreError::Crypto("ciphertext does not decrypt".to_string()));
        }
        Ok(self.users.lock().await.get(&user_id).cloned())
    }

    async fn set_server_url(&self, user_id: i64, server_url: &str) -> Result<(), StoreError> {
        self.check()?;
        if server_url.trim().is_empty() {
            return Err(StoreError::InvalidValue("server base url is empty".to_string()));
        }
        let mut users = self.users.lock().await;
        let entry = users.entry(user_id).or_insert_with(|| UserSettings {
            user_id,
            ..Default::default()
        });
        entry.server_url = Some(server_url.trim().to_string());
        Ok(())
    }

    async fn set_api_key(&self, user_id: i64, api_key: &str) -> Result<(), StoreError> {
        self.check()?;
        if api_key.trim().is_empty() {
            return Err(StoreError::InvalidValue("api key is empty".to_string()));
        }
        let mut users = self.users.lock().await;
        let entry = users.entry(user_id).or_insert_with(|| UserSettings {
            user_id,
            ..Default::default()
        });
        entry.api_key = Some(api_key.trim().to_string());
        Ok(())
    }

    async fn record_success(&self, user_id: i64, bookmark_id: &str) -> Result<(), StoreError> {
        self.check()?;
        if let Some(entry) = self.users.lock().await.get_mut(&user_id) {
            entry.last_success_id = Some(bookmark_id.to_string());
            entry.last_success_at = Some(Utc::now());
        }
        Ok(())
    }
}

//! SQLite persistence for per-user Karakeep settings.
//!
//! Each Telegram user has one row holding their Karakeep server, their API
//! key (encrypted with [`SecretBox`]) and the last successful save.
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, SecretBox, SqliteUserStore};
//! use keep_core::UserStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:data/bot.sqlite?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let store = SqliteUserStore::new(db, SecretBox::from_secret("master key")?);
//!     store.ensure_user(42).await?;
//!     store.set_server_url(42, "https://keep.example.com").await?;
//!
//!     Ok(())
//! }
//! ```

pub mod crypto;
pub mod error;
pub mod models;
pub mod store;
pub mod user;

pub use crypto::{CryptoError, SecretBox};
pub use error::{DatabaseError, Result};
pub use models::UserRow;
pub use store::SqliteUserStore;

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// SQLite serializes writers; one connection avoids busy errors.
    const DEFAULT_POOL_SIZE: u32 = 1;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// `sqlite::memory:` gives a throwaway database for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Open a database file, creating it and its parent directory if missing.
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect_with_options(options, Self::DEFAULT_POOL_SIZE, &path.display().to_string())
            .await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        Self::connect_with_options(options, pool_size, url).await
    }

    async fn connect_with_options(
        options: SqliteConnectOptions,
        pool_size: u32,
        label: &str,
    ) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", label, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keep_core::UserStore;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn test_store(db: Database) -> SqliteUserStore {
        SqliteUserStore::new(db, SecretBox::from_secret("test master key").unwrap())
    }

    #[tokio::test]
    async fn test_user_row_lifecycle() {
        let db = test_db().await;

        assert!(user::get_user(db.pool(), 7).await.unwrap().is_none());

        user::upsert_user(db.pool(), 7).await.unwrap();
        user::upsert_user(db.pool(), 7).await.unwrap();
        let row = user::get_user(db.pool(), 7).await.unwrap().unwrap();
        assert_eq!(row.server_base_url, "");
        assert!(row.last_success_time().is_none());

        user::set_last_success(db.pool(), 7, "bm_1").await.unwrap();
        let row = user::get_user(db.pool(), 7).await.unwrap().unwrap();
        assert_eq!(row.last_success_id.as_deref(), Some("bm_1"));
        assert!(row.last_success_time().is_some());
    }

    #[tokio::test]
    async fn test_store_encrypts_api_key() {
        let db = test_db().await;
        let store = test_store(db.clone());

        store.ensure_user(42).await.unwrap();
        store.set_server_url(42, "https://keep.example.com").await.unwrap();
        store.set_api_key(42, " ak_secret ").await.unwrap();

        let row = user::get_user(db.pool(), 42).await.unwrap().unwrap();
        assert!(!row.api_key_ciphertext.contains("ak_secret"));

        let settings = store.get_user(42).await.unwrap().unwrap();
        assert_eq!(
            settings.credentials(),
            Some(("https://keep.example.com", "ak_secret"))
        );
    }

    #[tokio::test]
    async fn test_setters_create_missing_rows() {
        let store = test_store(test_db().await);

        store.set_api_key(5, "key").await.unwrap();
        let settings = store.get_user(5).await.unwrap().unwrap();
        assert!(settings.server_url.is_none());
        assert_eq!(settings.api_key.as_deref(), Some("key"));
        assert!(settings.credentials().is_none());
    }

    #[tokio::test]
    async fn test_blank_values_are_rejected() {
        let store = test_store(test_db().await);

        assert!(matches!(
            store.set_api_key(1, "   ").await,
            Err(keep_core::StoreError::InvalidValue(_))
        ));
        assert!(store.set_server_url(1, "").await.is_err());
    }

    #[tokio::test]
    async fn test_record_success() {
        let store = test_store(test_db().await);
        store.ensure_user(9).await.unwrap();
        store.record_success(9, "bm_9").await.unwrap();

        let settings = store.get_user(9).await.unwrap().unwrap();
        assert_eq!(settings.last_success_id.as_deref(), Some("bm_9"));
        assert!(settings.last_success_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_user_is_none() {
        let store = test_store(test_db().await);
        assert!(store.get_user(404).await.unwrap().is_none());
    }
}

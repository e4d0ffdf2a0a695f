//! Database error types.

use keep_core::StoreError;
use thiserror::Error;

use crate::crypto::CryptoError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Encrypting or decrypting a stored secret failed
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// A value that must not be blank was blank
    #[error("{0} is empty")]
    Empty(&'static str),

    /// Filesystem error while preparing the database location
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Crypto(e) => StoreError::Crypto(e.to_string()),
            DatabaseError::Empty(what) => StoreError::InvalidValue(format!("{} is empty", what)),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

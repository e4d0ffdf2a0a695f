//! User settings queries.

use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::UserRow;

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Create the user row, or touch `updated_at` if it exists.
pub async fn upsert_user(pool: &SqlitePool, telegram_user_id: i64) -> Result<()> {
    let now = now();
    sqlx::query(
        r#"
        INSERT INTO users (telegram_user_id, created_at, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(telegram_user_id) DO UPDATE SET updated_at = excluded.updated_at
        "#,
    )
    .bind(telegram_user_id)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a user by Telegram id.
pub async fn get_user(pool: &SqlitePool, telegram_user_id: i64) -> Result<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT telegram_user_id, server_base_url, api_key_ciphertext,
               created_at, updated_at, last_success_at, last_success_id
        FROM users
        WHERE telegram_user_id = ?
        "#,
    )
    .bind(telegram_user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Store the user's Karakeep server, creating the row if needed.
pub async fn set_server_base_url(
    pool: &SqlitePool,
    telegram_user_id: i64,
    server_base_url: &str,
) -> Result<()> {
    if server_base_url.trim().is_empty() {
        return Err(DatabaseError::Empty("server base url"));
    }

    let now = now();
    sqlx::query(
        r#"
        INSERT INTO users (telegram_user_id, server_base_url, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(telegram_user_id) DO UPDATE
        SET server_base_url = excluded.server_base_url, updated_at = excluded.updated_at
        "#,
    )
    .bind(telegram_user_id)
    .bind(server_base_url.trim())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Store an already encrypted API key, creating the row if needed.
pub async fn set_api_key_ciphertext(
    pool: &SqlitePool,
    telegram_user_id: i64,
    ciphertext: &str,
) -> Result<()> {
    if ciphertext.is_empty() {
        return Err(DatabaseError::Empty("api key"));
    }

    let now = now();
    sqlx::query(
        r#"
        INSERT INTO users (telegram_user_id, api_key_ciphertext, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(telegram_user_id) DO UPDATE
        SET api_key_ciphertext = excluded.api_key_ciphertext, updated_at = excluded.updated_at
        "#,
    )
    .bind(telegram_user_id)
    .bind(ciphertext)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record the last successfully saved bookmark.
pub async fn set_last_success(
    pool: &SqlitePool,
    telegram_user_id: i64,
    bookmark_id: &str,
) -> Result<()> {
    let now = now();
    sqlx::query(
        r#"
        UPDATE users
        SET last_success_at = ?, last_success_id = ?, updated_at = ?
        WHERE telegram_user_id = ?
        "#,
    )
    .bind(&now)
    .bind(bookmark_id)
    .bind(&now)
    .bind(telegram_user_id)
    .execute(pool)
    .await?;

    Ok(())
}

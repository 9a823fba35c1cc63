//! Helper functions shared by the store, api and endpoints modules

use crate::{config, repo::sqlite_queries};
use chrono::{SecondsFormat, Utc};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};
use std::str::FromStr;

/// Current UTC time as RFC 3339 with millisecond precision and a `Z` suffix
pub fn utc_now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub async fn setup_sqlite_db_pool(app_config: &config::AppConfig) -> anyhow::Result<SqlitePool> {
    let connect_options =
        SqliteConnectOptions::from_str(&app_config.database_url)?.create_if_missing(true);

    let db_pool = match app_config.db_encryption_key() {
        Some(key) => {
            SqlitePool::connect_with(
                connect_options
                    .pragma("key", key)
                    .pragma("cipher_page_size", "1024")
                    .pragma("kdf_iter", "64000")
                    .pragma("cipher_hmac_algorithm", "HMAC_SHA1")
                    .pragma("cipher_kdf_algorithm", "PBKDF2_HMAC_SHA1")
                    .journal_mode(SqliteJournalMode::Delete),
            )
            .await?
        }
        None => {
            SqlitePool::connect_with(connect_options.journal_mode(SqliteJournalMode::Wal)).await?
        }
    };

    init_schema(&db_pool).await?;

    Ok(db_pool)
}

/// Creates the messages table and its indexes when missing
pub async fn init_schema(db_pool: &SqlitePool) -> anyhow::Result<()> {
    let mut transaction = db_pool.begin().await?;

    for query in [
        sqlite_queries::QUERY_CREATE_MESSAGES_TABLE,
        sqlite_queries::QUERY_CREATE_MESSAGES_FROM_INDEX,
        sqlite_queries::QUERY_CREATE_MESSAGES_TS_INDEX,
    ] {
        sqlx::query(query).execute(&mut *transaction).await?;
    }

    transaction.commit().await?;
    Ok(())
}

/// Single-connection in-memory database; more connections would each see an empty database
#[cfg(test)]
pub async fn setup_in_memory_db_pool() -> anyhow::Result<SqlitePool> {
    let db_pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
        .await?;

    init_schema(&db_pool).await?;
    Ok(db_pool)
}

#[cfg(test)]
pub async fn setup_file_db_pool(
    path: &std::path::Path,
    max_connections: u32,
) -> anyhow::Result<SqlitePool> {
    let db_pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(std::time::Duration::from_secs(10)),
        )
        .await?;

    init_schema(&db_pool).await?;
    Ok(db_pool)
}

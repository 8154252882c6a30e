//! Database pool creation and schema management for the filing pipeline.
//!
//! SQLite backs both local development and the test suite; the store
//! layer above is written against plain `sqlx` queries so a Postgres pool
//! could be substituted without touching call sites.

mod schema;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

pub use sqlx;

/// Pool type alias. Call sites depend on this alias, not `sqlx::SqlitePool`
/// directly, so swapping backends later only touches this crate.
pub type DbPool = SqlitePool;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Open a pool against `url` (e.g. `sqlite::memory:` or `sqlite:///path/to/db`)
/// and ensure every table in the schema exists.
pub async fn connect(url: &str) -> Result<DbPool, DbError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect_with(options)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Open an in-memory pool, primarily for tests.
pub async fn connect_in_memory() -> Result<DbPool, DbError> {
    connect("sqlite::memory:").await
}

/// Idempotently create every table and index the store layer needs.
pub async fn init_schema(pool: &DbPool) -> Result<(), DbError> {
    sqlx::query("PRAGMA foreign_keys = ON;")
        .execute(pool)
        .await?;
    sqlx::raw_sql(schema::CREATE_TABLES_SQL).execute(pool).await?;
    Ok(())
}

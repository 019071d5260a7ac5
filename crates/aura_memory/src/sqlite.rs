//! SQLite-backed [`RecordStore`].
//!
//! One row per `(user_id, field)` record, upserted atomically — the
//! concurrency contract is last-writer-wins at record granularity, the
//! same shape as the document store the gateway assumes.

use async_trait::async_trait;
use aura_core::store::{RecordStore, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS user_data (
    user_id    TEXT NOT NULL,
    field      TEXT NOT NULL,
    value      TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (user_id, field)
)";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists.
    pub async fn connect(path: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

fn backend_err(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get(&self, user_id: &str, field: &str) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            "SELECT value FROM user_data WHERE user_id = ?1 AND field = ?2",
        )
        .bind(user_id)
        .bind(field)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_err)
    }

    async fn set(&self, user_id: &str, field: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO user_data (user_id, field, value, updated_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (user_id, field) \
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(field)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(backend_err)
    }

    async fn delete(&self, user_id: &str, field: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM user_data WHERE user_id = ?1 AND field = ?2")
            .bind(user_id)
            .bind(field)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(backend_err)
    }
}

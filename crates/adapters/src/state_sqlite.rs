//! SQLite state store implementation

use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;
use x_autopost_domain::{PostRecord, StateError, StateStore};

const RATE_LIMIT_NOTICE_KEY: &str = "rate_limit";

/// SQLite-backed state store
#[derive(Clone)]
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Create a new SQLite state store, initializing the database if needed
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StateError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StateError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StateError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StateError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StateError::Database(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Connection pool, shared with the lock store
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn run_migrations(&self) -> Result<(), StateError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS post_records (
                item_id INTEGER PRIMARY KEY,
                posted_to_x INTEGER NOT NULL DEFAULT 0,
                last_x_update INTEGER,
                custom_hashtags TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notices (
                key TEXT PRIMARY KEY,
                message TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn get_post_record(&self, item_id: u64) -> Result<PostRecord, StateError> {
        let row: Option<(bool, Option<i64>, Option<String>)> = sqlx::query_as(
            "SELECT posted_to_x, last_x_update, custom_hashtags FROM post_records WHERE item_id = ?",
        )
        .bind(item_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StateError::Database(e.to_string()))?;

        match row {
            Some((posted, last_x_update, custom_hashtags)) => {
                let last_update_at = last_x_update
                    .map(OffsetDateTime::from_unix_timestamp)
                    .transpose()
                    .map_err(|e| StateError::Serialization(e.to_string()))?;

                Ok(PostRecord {
                    posted,
                    last_update_at,
                    custom_hashtags,
                })
            }
            None => Ok(PostRecord::default()),
        }
    }

    async fn save_post_record(
        &self,
        item_id: u64,
        record: &PostRecord,
    ) -> Result<(), StateError> {
        let last_x_update = record.last_update_at.map(|t| t.unix_timestamp());

        sqlx::query(
            r#"
            INSERT INTO post_records (item_id, posted_to_x, last_x_update, custom_hashtags)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(item_id) DO UPDATE SET
                posted_to_x = excluded.posted_to_x,
                last_x_update = excluded.last_x_update,
                custom_hashtags = excluded.custom_hashtags
            "#,
        )
        .bind(item_id as i64)
        .bind(record.posted)
        .bind(last_x_update)
        .bind(&record.custom_hashtags)
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Database(e.to_string()))?;

        Ok(())
    }

    async fn set_rate_limit_notice(&self, message: &str) -> Result<(), StateError> {
        sqlx::query(
            r#"
            INSERT INTO notices (key, message) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET message = excluded.message
            "#,
        )
        .bind(RATE_LIMIT_NOTICE_KEY)
        .bind(message)
        .execute(&self.pool)
        .await
        .map_err(|e| StateError::Database(e.to_string()))?;

        Ok(())
    }

    async fn rate_limit_notice(&self) -> Result<Option<String>, StateError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT message FROM notices WHERE key = ?")
            .bind(RATE_LIMIT_NOTICE_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StateError::Database(e.to_string()))?;

        Ok(row.map(|(message,)| message))
    }

    async fn take_rate_limit_notice(&self) -> Result<Option<String>, StateError> {
        let row: Option<(String,)> =
            sqlx::query_as("DELETE FROM notices WHERE key = ? RETURNING message")
                .bind(RATE_LIMIT_NOTICE_KEY)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StateError::Database(e.to_string()))?;

        Ok(row.map(|(message,)| message))
    }
}

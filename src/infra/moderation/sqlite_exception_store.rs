// SQLite-backed exception store.
//
// Tables:
// - language_exceptions: exempted phrases, scoped per group

use crate::core::moderation::{ExceptionEntry, ExceptionError, ExceptionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteExceptionStore {
    pool: Pool<Sqlite>,
}

impl SqliteExceptionStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `database_url` and run migrations.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), ExceptionError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS language_exceptions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                group_id INTEGER NOT NULL,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_language_exceptions_group
                ON language_exceptions(group_id, text);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ExceptionError::StorageError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl ExceptionStore for SqliteExceptionStore {
    async fn add(&self, entry: ExceptionEntry) -> Result<(), ExceptionError> {
        sqlx::query(
            r#"
            INSERT INTO language_exceptions (group_id, text, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(entry.group_id as i64)
        .bind(&entry.text)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ExceptionError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn remove(&self, group_id: u64, text: &str) -> Result<u64, ExceptionError> {
        let result = sqlx::query("DELETE FROM language_exceptions WHERE group_id = ? AND text = ?")
            .bind(group_id as i64)
            .bind(text)
            .execute(&self.pool)
            .await
            .map_err(|e| ExceptionError::StorageError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn list(&self, group_id: u64) -> Result<Vec<ExceptionEntry>, ExceptionError> {
        let rows = sqlx::query(
            r#"
            SELECT text, created_at
            FROM language_exceptions
            WHERE group_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(group_id as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ExceptionError::StorageError(e.to_string()))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let created_at_str: String = row.get("created_at");
            let created_at = DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());

            entries.push(ExceptionEntry {
                group_id,
                text: row.get("text"),
                created_at,
            });
        }
        Ok(entries)
    }
}

//! SQLite backend.
//!
//! One table, `interactions`, with an autoincrement integer key so ids stay
//! strictly increasing even across deletes made by outside tools.

use async_trait::async_trait;
use chrono::Utc;
use parley_core::error::LogError;
use parley_core::log::{InteractionLog, LogRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A SQLite-backed interaction log.
pub struct SqliteLog {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl SqliteLog {
    /// Open (or create) the database at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral in-process database.
    pub async fn new(path: &str) -> Result<Self, LogError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| LogError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Every connection to `:memory:` is its own database
        let max_connections = if path.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| LogError::Storage(format!("Failed to open SQLite: {e}")))?;

        let log = Self::from_pool(pool).await?;
        info!("SQLite interaction log initialized at {path}");
        Ok(log)
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, LogError> {
        let log = Self {
            pool,
            write_lock: Mutex::new(()),
        };
        log.run_migrations().await?;
        Ok(log)
    }

    async fn run_migrations(&self) -> Result<(), LogError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS interactions (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                user_text      TEXT NOT NULL,
                assistant_text TEXT NOT NULL,
                created_at     TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LogError::MigrationFailed(format!("interactions table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<LogRecord, LogError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| LogError::QueryFailed(format!("id column: {e}")))?;
        let user_text: String = row
            .try_get("user_text")
            .map_err(|e| LogError::QueryFailed(format!("user_text column: {e}")))?;
        let assistant_text: String = row
            .try_get("assistant_text")
            .map_err(|e| LogError::QueryFailed(format!("assistant_text column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| LogError::QueryFailed(format!("created_at column: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| LogError::QueryFailed(format!("created_at of row {id}: {e}")))?;

        Ok(LogRecord {
            id,
            user_text,
            assistant_text,
            created_at,
        })
    }
}

#[async_trait]
impl InteractionLog for SqliteLog {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, user_text: &str, assistant_text: &str) -> Result<i64, LogError> {
        let _guard = self.write_lock.lock().await;

        let result = sqlx::query(
            "INSERT INTO interactions (user_text, assistant_text, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_text)
        .bind(assistant_text)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| LogError::Storage(format!("Insert failed: {e}")))?;

        let id = result.last_insert_rowid();
        debug!(id, "Appended log record");
        Ok(id)
    }

    async fn read_all(&self) -> Result<Vec<LogRecord>, LogError> {
        let rows = sqlx::query(
            "SELECT id, user_text, assistant_text, created_at FROM interactions ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LogError::QueryFailed(format!("Read failed: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn test_log() -> SqliteLog {
        SqliteLog::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn append_returns_increasing_ids() {
        let log = test_log().await;
        assert_eq!(log.append("Hello", "Hi there").await.unwrap(), 1);
        assert_eq!(log.append("Again", "Yes?").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn read_all_in_insertion_order() {
        let log = test_log().await;
        log.append("first", "1").await.unwrap();
        log.append("second", "2").await.unwrap();
        log.append("third", "3").await.unwrap();

        let records = log.read_all().await.unwrap();
        let users: Vec<&str> = records.iter().map(|r| r.user_text.as_str()).collect();
        assert_eq!(users, vec!["first", "second", "third"]);
        assert_eq!(records[1].assistant_text, "2");
    }

    #[tokio::test]
    async fn empty_log_reads_empty() {
        let log = test_log().await;
        assert!(log.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn text_is_stored_verbatim() {
        let log = test_log().await;
        let tricky = "quote ' and \"double\"\nnewline; DROP TABLE interactions;";
        log.append(tricky, "ok").await.unwrap();
        assert_eq!(log.read_all().await.unwrap()[0].user_text, tricky);
    }

    #[tokio::test]
    async fn persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("log.db").display());

        {
            let log = SqliteLog::new(&url).await.unwrap();
            log.append("Hello", "Hi there").await.unwrap();
        }

        let log = SqliteLog::new(&url).await.unwrap();
        assert_eq!(log.append("Bye", "Goodbye").await.unwrap(), 2);
        assert_eq!(log.read_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_appends_get_unique_ids() {
        let log = Arc::new(test_log().await);
        let mut handles = Vec::new();
        for i in 0..10 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                log.append(&format!("q{i}"), &format!("a{i}")).await.unwrap()
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.sort();
        assert_eq!(ids, (1..=10).collect::<Vec<i64>>());
    }
}

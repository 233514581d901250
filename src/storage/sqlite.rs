//! SQLite event log
//!
//! Entries are stored as JSON in the `entry` column, with the timestamp,
//! subject and status broken out for filtering. Reads order by `timestamp`
//! and break ties with `seq`, the append order.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, warn};

use super::error::{StorageError, StorageResult};
use super::event_log::{EventLog, HealthStatus, LogEntry};

/// Open a pooled connection with WAL enabled, creating the file and its
/// parent directory if missing
pub(crate) async fn connect(db_path: &Path) -> StorageResult<Pool<Sqlite>> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::ConnectionFailed(e.to_string()))
}

pub struct SqliteEventLog {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteEventLog {
    #[instrument(skip_all)]
    pub async fn open(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path = db_path.as_ref();
        info!("initializing SQLite event log at: {}", db_path.display());

        let pool = connect(db_path).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS event_log (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                subject_id TEXT NOT NULL,
                status TEXT NOT NULL,
                has_alert INTEGER NOT NULL DEFAULT 0,
                entry TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_event_log_subject ON event_log (subject_id, timestamp)",
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_event_log_timestamp ON event_log (timestamp, seq)")
            .execute(&pool)
            .await?;

        Ok(Self {
            pool,
            db_path: db_path.display().to_string(),
        })
    }

    fn decode(rows: Vec<sqlx::sqlite::SqliteRow>) -> StorageResult<Vec<LogEntry>> {
        let mut entries = rows
            .into_iter()
            .map(|row| {
                let json: String = row.get("entry");
                serde_json::from_str(&json).map_err(StorageError::from)
            })
            .collect::<StorageResult<Vec<LogEntry>>>()?;

        // queried newest first
        entries.reverse();
        Ok(entries)
    }

    pub async fn close(&self) {
        info!("closing SQLite event log");
        self.pool.close().await;
    }
}

#[async_trait]
impl EventLog for SqliteEventLog {
    #[instrument(skip(self, entry), fields(subject = %entry.subject_id()))]
    async fn append(&self, entry: LogEntry) -> StorageResult<()> {
        let json = serde_json::to_string(&entry)?;

        sqlx::query(
            r#"
            INSERT INTO event_log (timestamp, subject_id, status, has_alert, entry)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.timestamp().timestamp_millis())
        .bind(entry.subject_id())
        .bind(entry.status.as_str())
        .bind(entry.alert.is_some())
        .bind(json)
        .execute(&self.pool)
        .await?;

        debug!("entry appended");
        Ok(())
    }

    async fn tail(&self, n: usize) -> StorageResult<Vec<LogEntry>> {
        let rows = sqlx::query(
            "SELECT entry FROM event_log ORDER BY timestamp DESC, seq DESC LIMIT ?",
        )
            .bind(n as i64)
            .fetch_all(&self.pool)
            .await?;

        Self::decode(rows)
    }

    async fn alerts(&self, n: usize) -> StorageResult<Vec<LogEntry>> {
        let rows = sqlx::query(
            "SELECT entry FROM event_log WHERE has_alert = 1 ORDER BY timestamp DESC, seq DESC LIMIT ?",
        )
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await?;

        Self::decode(rows)
    }

    async fn since(&self, since: DateTime<Utc>) -> StorageResult<Vec<LogEntry>> {
        let rows = sqlx::query(
            "SELECT entry FROM event_log WHERE timestamp >= ? ORDER BY timestamp DESC, seq DESC",
        )
        .bind(since.timestamp_millis())
        .fetch_all(&self.pool)
        .await?;

        Self::decode(rows)
    }

    async fn len(&self) -> StorageResult<usize> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM event_log")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as usize)
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let mut metadata = HashMap::new();
        metadata.insert("backend".to_string(), "sqlite".to_string());
        metadata.insert("db_path".to_string(), self.db_path.clone());

        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => Ok(HealthStatus {
                healthy: true,
                message: "SQLite event log operational".to_string(),
                metadata,
            }),
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata,
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

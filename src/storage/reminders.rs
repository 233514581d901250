//! Reminder task storage

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::error::{StorageError, StorageResult};

static TIME_OF_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid time-of-day regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTask {
    pub id: i64,
    pub text: String,
    /// Local wall-clock time, `HH:MM`
    pub time: String,
}

/// Validate and normalise a new reminder
pub fn validate(text: &str, time: &str) -> StorageResult<(String, String)> {
    let text = text.trim();
    let time = time.trim();

    if text.is_empty() {
        return Err(StorageError::InvalidInput(
            "reminder text must not be empty".to_string(),
        ));
    }

    if !TIME_OF_DAY.is_match(time) {
        return Err(StorageError::InvalidInput(format!(
            "reminder time must be HH:MM, got '{time}'"
        )));
    }

    Ok((text.to_string(), time.to_string()))
}

#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Tasks scheduled for the given `HH:MM`
    async fn list_due(&self, time: &str) -> StorageResult<Vec<ReminderTask>>;

    /// All tasks ordered by time
    async fn list(&self) -> StorageResult<Vec<ReminderTask>>;

    async fn create(&self, text: &str, time: &str) -> StorageResult<ReminderTask>;

    async fn delete(&self, id: i64) -> StorageResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryReminderStore {
    tasks: RwLock<(i64, Vec<ReminderTask>)>,
}

impl MemoryReminderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReminderStore for MemoryReminderStore {
    async fn list_due(&self, time: &str) -> StorageResult<Vec<ReminderTask>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.1.iter().filter(|t| t.time == time).cloned().collect())
    }

    async fn list(&self) -> StorageResult<Vec<ReminderTask>> {
        let mut tasks = self.tasks.read().await.1.clone();
        tasks.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn create(&self, text: &str, time: &str) -> StorageResult<ReminderTask> {
        let (text, time) = validate(text, time)?;
        let mut tasks = self.tasks.write().await;

        tasks.0 += 1;
        let task = ReminderTask {
            id: tasks.0,
            text,
            time,
        };
        tasks.1.push(task.clone());

        debug!("reminder {} created for {}", task.id, task.time);
        Ok(task)
    }

    async fn delete(&self, id: i64) -> StorageResult<()> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.1.len();
        tasks.1.retain(|t| t.id != id);

        if tasks.1.len() == before {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(feature = "storage-sqlite")]
pub use sqlite::SqliteReminderStore;

#[cfg(feature = "storage-sqlite")]
mod sqlite {
    use std::path::Path;

    use sqlx::{Pool, Sqlite};

    use super::*;
    use crate::storage::sqlite::connect;

    pub struct SqliteReminderStore {
        pool: Pool<Sqlite>,
    }

    impl SqliteReminderStore {
        pub async fn open(db_path: impl AsRef<Path>) -> StorageResult<Self> {
            let db_path = db_path.as_ref();
            let pool = connect(db_path).await?;

            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS reminders (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    task TEXT NOT NULL,
                    time TEXT NOT NULL
                )
                "#,
            )
            .execute(&pool)
            .await?;

            info!("reminder store opened at {}", db_path.display());
            Ok(Self { pool })
        }
    }

    #[async_trait]
    impl ReminderStore for SqliteReminderStore {
        async fn list_due(&self, time: &str) -> StorageResult<Vec<ReminderTask>> {
            let rows: Vec<(i64, String, String)> =
                sqlx::query_as("SELECT id, task, time FROM reminders WHERE time = ? ORDER BY id")
                    .bind(time)
                    .fetch_all(&self.pool)
                    .await?;

            Ok(rows
                .into_iter()
                .map(|(id, text, time)| ReminderTask { id, text, time })
                .collect())
        }

        async fn list(&self) -> StorageResult<Vec<ReminderTask>> {
            let rows: Vec<(i64, String, String)> =
                sqlx::query_as("SELECT id, task, time FROM reminders ORDER BY time, id")
                    .fetch_all(&self.pool)
                    .await?;

            Ok(rows
                .into_iter()
                .map(|(id, text, time)| ReminderTask { id, text, time })
                .collect())
        }

        async fn create(&self, text: &str, time: &str) -> StorageResult<ReminderTask> {
            let (text, time) = validate(text, time)?;

            let result = sqlx::query("INSERT INTO reminders (task, time) VALUES (?, ?)")
                .bind(&text)
                .bind(&time)
                .execute(&self.pool)
                .await?;

            let task = ReminderTask {
                id: result.last_insert_rowid(),
                text,
                time,
            };
            debug!("reminder {} created for {}", task.id, task.time);
            Ok(task)
        }

        async fn delete(&self, id: i64) -> StorageResult<()> {
            let result = sqlx::query("DELETE FROM reminders WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;

            if result.rows_affected() == 0 {
                return Err(StorageError::NotFound(id));
            }
            Ok(())
        }
    }
}

//! Persistence for the event log and reminder tasks
//!
//! ## Event log backends
//!
//! - **JSON lines** (default): append-only file, one record per line
//! - **SQLite** (feature `storage-sqlite`): single-row inserts, WAL mode
//! - **In-memory**: no persistence, used by tests and `backend: "none"`
//!
//! ## Usage
//!
//! ```no_run
//! use carewatch::storage::{EventLog, jsonl::JsonLinesEventLog};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let log = JsonLinesEventLog::open("./data/health_log.jsonl").await?;
//!     println!("{} entries", log.len().await?);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod event_log;
pub mod jsonl;
pub mod memory;
pub mod reminders;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::{ReminderStoreConfig, StorageConfig};

pub use error::{StorageError, StorageResult};
pub use event_log::{AlertRecord, EventLog, HealthStatus, LogEntry};
pub use reminders::{ReminderStore, ReminderTask};

/// Open the configured event log backend
pub async fn open_event_log(config: &StorageConfig) -> anyhow::Result<Arc<dyn EventLog>> {
    let log: Arc<dyn EventLog> = match config {
        StorageConfig::None => {
            info!("event log kept in memory only");
            Arc::new(memory::MemoryEventLog::new())
        }
        StorageConfig::Jsonl { path } => Arc::new(
            jsonl::JsonLinesEventLog::open(path)
                .await
                .with_context(|| format!("failed to open event log {}", path.display()))?,
        ),
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path } => Arc::new(
            sqlite::SqliteEventLog::open(path)
                .await
                .with_context(|| format!("failed to open event log {}", path.display()))?,
        ),
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => {
            anyhow::bail!("SQLite storage requires the `storage-sqlite` feature")
        }
    };

    Ok(log)
}

/// Open the configured reminder store
pub async fn open_reminder_store(
    config: &ReminderStoreConfig,
) -> anyhow::Result<Arc<dyn ReminderStore>> {
    match &config.path {
        #[cfg(feature = "storage-sqlite")]
        Some(path) => Ok(Arc::new(
            reminders::SqliteReminderStore::open(path)
                .await
                .with_context(|| format!("failed to open reminder store {}", path.display()))?,
        )),
        #[cfg(not(feature = "storage-sqlite"))]
        Some(_) => anyhow::bail!("a persistent reminder store requires the `storage-sqlite` feature"),
        None => {
            info!("reminders kept in memory only");
            Ok(Arc::new(reminders::MemoryReminderStore::new()))
        }
    }
}

//! In-memory event log (no persistence)
//!
//! Used by tests and when the storage backend is `none`. All entries are
//! lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::trace;

use super::error::StorageResult;
use super::event_log::{EventLog, HealthStatus, LogEntry, keep_last};

#[derive(Debug, Default)]
pub struct MemoryEventLog {
    entries: RwLock<Vec<LogEntry>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(&self, entry: LogEntry) -> StorageResult<()> {
        let mut entries = self.entries.write().await;
        // after every entry sampled at or before this one
        let at = entries.partition_point(|e| e.timestamp() <= entry.timestamp());
        entries.insert(at, entry);
        trace!("in-memory log holds {} entries", entries.len());
        Ok(())
    }

    async fn tail(&self, n: usize) -> StorageResult<Vec<LogEntry>> {
        let entries = self.entries.read().await;
        let skip = entries.len().saturating_sub(n);
        Ok(entries[skip..].to_vec())
    }

    async fn alerts(&self, n: usize) -> StorageResult<Vec<LogEntry>> {
        let entries = self.entries.read().await;
        let alerts = entries
            .iter()
            .filter(|entry| entry.alert.is_some())
            .cloned()
            .collect();
        Ok(keep_last(alerts, n))
    }

    async fn since(&self, since: DateTime<Utc>) -> StorageResult<Vec<LogEntry>> {
        let entries = self.entries.read().await;
        let from = entries.partition_point(|e| e.timestamp() < since);
        Ok(entries[from..].to_vec())
    }

    async fn len(&self) -> StorageResult<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        Ok(HealthStatus {
            healthy: true,
            message: "in-memory event log operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("entries".to_string(), self.len().await?.to_string()),
            ]),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

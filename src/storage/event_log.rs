//! Event log trait and record types
//!
//! Every tick of a monitor produces exactly one [`LogEntry`]. Entries are
//! never updated or deleted. Every backend returns them ordered by sample
//! timestamp, entries with equal timestamps in append order. A slow tick
//! (text generation, delivery) may append after a faster tick that sampled
//! later; reads still come back in timestamp order.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StorageResult;
use crate::monitors::classifier::{IssueSignature, Status};
use crate::{IssueSet, Sample};

/// An alert approved by the deduplicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub subject_id: String,
    pub issues: IssueSet,
    pub signature: IssueSignature,
    pub message: String,
    pub fired_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub sample: Sample,
    pub issues: IssueSet,
    pub message: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertRecord>,
}

impl LogEntry {
    /// Build the entry for a tick; the status follows from `issues`
    pub fn new(sample: Sample, issues: IssueSet, message: impl Into<String>) -> Self {
        let status = Status::of(&issues);
        Self {
            sample,
            issues,
            message: message.into(),
            status,
            alert: None,
        }
    }

    pub fn with_alert(mut self, alert: AlertRecord) -> Self {
        self.alert = Some(alert);
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.sample.timestamp
    }

    pub fn subject_id(&self) -> &str {
        &self.sample.subject_id
    }
}

/// Health status of an event log backend
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    pub message: String,
    pub metadata: HashMap<String, String>,
}

#[async_trait]
pub trait EventLog: Send + Sync {
    /// Append one entry. Concurrent appends are serialized by the backend.
    async fn append(&self, entry: LogEntry) -> StorageResult<()>;

    /// Up to `n` most recent entries, most recent last
    async fn tail(&self, n: usize) -> StorageResult<Vec<LogEntry>>;

    /// Up to `n` most recent entries that carry an alert, most recent last
    async fn alerts(&self, n: usize) -> StorageResult<Vec<LogEntry>>;

    /// Entries sampled at or after `since`, oldest first
    async fn since(&self, since: DateTime<Utc>) -> StorageResult<Vec<LogEntry>>;

    async fn len(&self) -> StorageResult<usize>;

    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Backend name for logs and stats
    fn name(&self) -> &'static str;
}

/// Keep the last `n` items of an ordered list
pub(crate) fn keep_last<T>(mut items: Vec<T>, n: usize) -> Vec<T> {
    let skip = items.len().saturating_sub(n);
    items.drain(..skip);
    items
}

/// Stable sort by sample timestamp
pub(crate) fn order_by_timestamp(entries: &mut [LogEntry]) {
    entries.sort_by_key(LogEntry::timestamp);
}

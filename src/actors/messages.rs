//! Message types for actor communication
//!
//! Every actor owns an mpsc command channel. Requests that need an answer
//! carry a oneshot `respond_to` sender.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::notify::Message;
use crate::storage::{LogEntry, ReminderTask, StorageError};

/// Commands that can be sent to a MonitorActor
#[derive(Debug)]
pub enum MonitorCommand {
    /// Run a tick immediately, bypassing the interval timer
    TickNow {
        respond_to: oneshot::Sender<Result<TickOutcome, TickError>>,
    },

    /// Update the tick interval; takes effect immediately
    UpdateInterval { interval_secs: u64 },

    GetStats {
        respond_to: oneshot::Sender<TickStats>,
    },

    /// Stop after the current tick
    Shutdown,
}

/// Commands that can be sent to the ReminderActor
#[derive(Debug)]
pub enum ReminderCommand {
    TickNow {
        respond_to: oneshot::Sender<Result<Vec<ReminderDispatch>, TickError>>,
    },

    UpdateInterval { interval_secs: u64 },

    GetStats {
        respond_to: oneshot::Sender<TickStats>,
    },

    Shutdown,
}

/// Result of a single monitor tick
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// The source had no sample; nothing was classified or logged
    Skipped { reason: String },

    /// A sample was classified and its entry appended to the event log
    Logged(Box<LogEntry>),
}

impl TickOutcome {
    pub fn entry(&self) -> Option<&LogEntry> {
        match self {
            TickOutcome::Logged(entry) => Some(entry),
            TickOutcome::Skipped { .. } => None,
        }
    }

    /// Whether this tick fired an alert
    pub fn fired(&self) -> bool {
        self.entry().is_some_and(|entry| entry.alert.is_some())
    }

    /// Whether this tick found issues but the alert was held back
    pub fn suppressed(&self) -> bool {
        self.entry()
            .is_some_and(|entry| !entry.issues.is_empty() && entry.alert.is_none())
    }
}

#[derive(Debug, Error)]
pub enum TickError {
    #[error("event log append failed after {attempts} attempts: {source}")]
    Persistence {
        attempts: u32,
        #[source]
        source: StorageError,
    },

    #[error("reminder store unavailable: {0}")]
    Store(#[source] StorageError),
}

/// The record of a fired reminder
#[derive(Debug, Clone, Serialize)]
pub struct ReminderDispatch {
    pub task: ReminderTask,
    pub message: Message,
    pub fired_at: DateTime<Utc>,
}

/// Per-actor counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickStats {
    pub name: String,
    pub interval_secs: u64,
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub failed_ticks: u64,
    pub alerts_fired: u64,
    pub alerts_suppressed: u64,
    pub reminders_sent: u64,
    pub last_tick: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl TickStats {
    pub fn new(name: impl Into<String>, interval_secs: u64) -> Self {
        Self {
            name: name.into(),
            interval_secs,
            ..Default::default()
        }
    }

    pub(crate) fn record_failure(&mut self, error: &TickError) {
        self.failed_ticks += 1;
        self.last_error = Some(error.to_string());
    }
}

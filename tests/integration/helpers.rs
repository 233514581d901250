//! Helper types and functions for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use carewatch::{
    SourceKind,
    actors::{MonitorContext, MonitorHandle},
    config::Thresholds,
    metric,
    monitors::dedup::DedupState,
    notify::{
        Message, Notifier,
        channels::{ChannelError, NotifyChannel},
        generator::{GenerationError, TextGenerator},
    },
    sources::ReplaySource,
    storage::{
        EventLog, HealthStatus, LogEntry, StorageError, StorageResult, memory::MemoryEventLog,
    },
};
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

pub const HOUR: Duration = Duration::from_secs(3600);

pub fn vitals(
    heart_rate: f64,
    bp_sys: f64,
    bp_dia: f64,
    glucose: f64,
) -> [(&'static str, f64); 4] {
    [
        (metric::HEART_RATE, heart_rate),
        (metric::BP_SYS, bp_sys),
        (metric::BP_DIA, bp_dia),
        (metric::GLUCOSE, glucose),
    ]
}

/// Replay source whose first reading is normal; the immediate first tick
/// of a monitor consumes it
pub fn replay(kind: SourceKind) -> ReplaySource {
    match kind {
        SourceKind::Health => ReplaySource::new(kind).push(vitals(72.0, 120.0, 80.0, 100.0)),
        SourceKind::Safety => ReplaySource::new(kind)
            .push([(metric::MOVEMENT, 1.0), (metric::INACTIVE_SECS, 0.0)]),
    }
}

/// Spawn a monitor with an hour-long interval and wait for its first tick,
/// after which only `tick_now` drives it
pub async fn spawn_monitor(
    name: &str,
    source: ReplaySource,
    ctx: MonitorContext,
) -> (MonitorHandle, JoinHandle<()>) {
    let (handle, task) = MonitorHandle::spawn(name, Box::new(source), ctx, HOUR);

    while handle.stats().await.unwrap().ticks == 0 {
        tokio::task::yield_now().await;
    }

    (handle, task)
}

pub fn context(
    log: Arc<dyn EventLog>,
    notifier: Arc<Notifier>,
    cool_down: Duration,
) -> MonitorContext {
    MonitorContext {
        subject_id: "resident-1".to_string(),
        display_name: "resident-1".to_string(),
        thresholds: Thresholds::default(),
        dedup: Arc::new(DedupState::new(cool_down)),
        notifier,
        log,
        append_retries: 2,
    }
}

/// Channel that keeps every delivered message
#[derive(Default)]
pub struct RecordingChannel {
    delivered: Mutex<Vec<Message>>,
}

impl RecordingChannel {
    pub fn messages(&self) -> Vec<Message> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifyChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, message: &Message) -> Result<(), ChannelError> {
        self.delivered.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Channel that always fails
pub struct FailingChannel;

#[async_trait]
impl NotifyChannel for FailingChannel {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn deliver(&self, _message: &Message) -> Result<(), ChannelError> {
        Err(ChannelError::Status(500))
    }
}

/// Channel that never finishes within any reasonable timeout
pub struct StuckChannel;

#[async_trait]
impl NotifyChannel for StuckChannel {
    fn name(&self) -> &'static str {
        "stuck"
    }

    async fn deliver(&self, _message: &Message) -> Result<(), ChannelError> {
        tokio::time::sleep(HOUR).await;
        Ok(())
    }
}

/// Generator returning a fixed reply, or failing when `reply` is `None`
pub struct FixedGenerator {
    pub reply: Option<String>,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl FixedGenerator {
    pub fn new(reply: Option<&str>) -> Self {
        Self {
            reply: reply.map(str::to_string),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().ok_or(GenerationError::EmptyResponse)
    }
}

/// Event log whose first `failures` appends fail
pub struct FlakyLog {
    failures: AtomicUsize,
    pub attempts: AtomicUsize,
    inner: MemoryEventLog,
}

impl FlakyLog {
    pub fn new(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
            inner: MemoryEventLog::new(),
        }
    }
}

#[async_trait]
impl EventLog for FlakyLog {
    async fn append(&self, entry: LogEntry) -> StorageResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }

        self.inner.append(entry).await
    }

    async fn tail(&self, n: usize) -> StorageResult<Vec<LogEntry>> {
        self.inner.tail(n).await
    }

    async fn alerts(&self, n: usize) -> StorageResult<Vec<LogEntry>> {
        self.inner.alerts(n).await
    }

    async fn since(&self, since: DateTime<Utc>) -> StorageResult<Vec<LogEntry>> {
        self.inner.since(since).await
    }

    async fn len(&self) -> StorageResult<usize> {
        self.inner.len().await
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.inner.health_check().await
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

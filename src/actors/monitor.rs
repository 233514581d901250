//! MonitorActor - runs one monitoring loop over a reading source
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → next_sample → classify → try_fire → render + deliver → append
//!     ↑
//!     └─── Commands (TickNow, UpdateInterval, GetStats, Shutdown)
//! ```
//!
//! A tick never ends the loop. A missing sample skips the tick, and a failed
//! append is retried before the tick is reported as failed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::Thresholds;
use crate::monitors::classifier::classify;
use crate::monitors::dedup::DedupState;
use crate::notify::{Notifier, templates};
use crate::sources::ReadingSource;
use crate::storage::{AlertRecord, EventLog, LogEntry};

use super::messages::{MonitorCommand, TickError, TickOutcome, TickStats};

const APPEND_BACKOFF: Duration = Duration::from_millis(100);

/// Collaborators shared by every monitoring loop
#[derive(Clone)]
pub struct MonitorContext {
    pub subject_id: String,
    /// Name used in messages, e.g. "Grandma Rose"
    pub display_name: String,
    pub thresholds: Thresholds,
    pub dedup: Arc<DedupState>,
    pub notifier: Arc<Notifier>,
    pub log: Arc<dyn EventLog>,
    pub append_retries: u32,
}

pub(super) fn new_ticker(period: Duration) -> Interval {
    let mut ticker = interval(period.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

pub struct MonitorActor {
    source: Box<dyn ReadingSource>,
    ctx: MonitorContext,
    command_rx: mpsc::Receiver<MonitorCommand>,
    interval_duration: Duration,
    stats: TickStats,
}

impl MonitorActor {
    pub fn new(
        name: String,
        source: Box<dyn ReadingSource>,
        ctx: MonitorContext,
        interval_duration: Duration,
        command_rx: mpsc::Receiver<MonitorCommand>,
    ) -> Self {
        Self {
            source,
            ctx,
            command_rx,
            stats: TickStats::new(name, interval_duration.as_secs()),
            interval_duration,
        }
    }

    #[instrument(skip(self), fields(monitor = %self.stats.name, subject = %self.ctx.subject_id))]
    pub async fn run(mut self) {
        debug!("starting monitor actor");

        let mut ticker = new_ticker(self.interval_duration);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        error!("tick failed: {e}");
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        MonitorCommand::TickNow { respond_to } => {
                            debug!("received TickNow command");
                            let result = self.tick().await;
                            let _ = respond_to.send(result);
                        }

                        MonitorCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                            self.stats.interval_secs = interval_secs;
                            ticker = new_ticker(self.interval_duration);
                        }

                        MonitorCommand::GetStats { respond_to } => {
                            let _ = respond_to.send(self.stats.clone());
                        }

                        MonitorCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("monitor actor stopped");
    }

    /// Run one tick and account for it in the stats
    async fn tick(&mut self) -> Result<TickOutcome, TickError> {
        self.stats.ticks += 1;
        self.stats.last_tick = Some(chrono::Utc::now());

        let result = self.process().await;

        match &result {
            Ok(TickOutcome::Skipped { .. }) => self.stats.skipped_ticks += 1,
            Ok(outcome) if outcome.fired() => self.stats.alerts_fired += 1,
            Ok(outcome) if outcome.suppressed() => self.stats.alerts_suppressed += 1,
            Ok(_) => {}
            Err(e) => self.stats.record_failure(e),
        }

        result
    }

    async fn process(&mut self) -> Result<TickOutcome, TickError> {
        let sample = match self.source.next_sample(&self.ctx.subject_id).await {
            Ok(sample) => sample,
            Err(e) => {
                warn!("skipping tick: {e}");
                return Ok(TickOutcome::Skipped {
                    reason: e.to_string(),
                });
            }
        };

        let issues = classify(&sample, &self.ctx.thresholds);
        trace!("classified {} as {:?}", sample.summary(), issues);

        let expired = self.ctx.dedup.prune(sample.timestamp);
        if expired > 0 {
            trace!("dropped {expired} expired dedup record(s)");
        }

        let entry = if issues.is_empty() {
            let message = templates::normal_message(&sample);
            LogEntry::new(sample, issues, message)
        } else {
            let signature = issues.signature();

            if self
                .ctx
                .dedup
                .try_fire(&sample.subject_id, &signature, sample.timestamp)
            {
                let message = self
                    .ctx
                    .notifier
                    .render_alert(&self.ctx.display_name, &issues, &sample)
                    .await;
                self.ctx.notifier.deliver(&message).await;
                self.source.alert_fired(&issues, sample.timestamp);

                info!(signature = %signature, "alert fired");

                let alert = AlertRecord {
                    subject_id: sample.subject_id.clone(),
                    issues: issues.clone(),
                    signature,
                    message: message.body.clone(),
                    fired_at: sample.timestamp,
                };
                LogEntry::new(sample, issues, message.body).with_alert(alert)
            } else {
                debug!(signature = %signature, "alert suppressed by cool-down");
                let message = templates::ongoing_message(&self.ctx.display_name, &issues, &sample);
                LogEntry::new(sample, issues, message)
            }
        };

        append(&self.ctx, &entry).await?;
        Ok(TickOutcome::Logged(Box::new(entry)))
    }
}

/// Append `entry`, retrying up to `append_retries` times with a growing backoff
async fn append(ctx: &MonitorContext, entry: &LogEntry) -> Result<(), TickError> {
    let mut attempt = 0;

    loop {
        attempt += 1;

        match ctx.log.append(entry.clone()).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt > ctx.append_retries => {
                return Err(TickError::Persistence {
                    attempts: attempt,
                    source: e,
                });
            }
            Err(e) => {
                warn!("event log append failed (attempt {attempt}): {e}");
                tokio::time::sleep(APPEND_BACKOFF * attempt).await;
            }
        }
    }
}

/// Handle for controlling a MonitorActor
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,
    pub name: String,
}

impl MonitorHandle {
    /// Spawn a monitor actor; the join handle resolves once the loop has stopped
    pub fn spawn(
        name: impl Into<String>,
        source: Box<dyn ReadingSource>,
        ctx: MonitorContext,
        interval_duration: Duration,
    ) -> (Self, JoinHandle<()>) {
        let name = name.into();
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = MonitorActor::new(name.clone(), source, ctx, interval_duration, cmd_rx);
        let task = tokio::spawn(actor.run());

        (
            Self {
                sender: cmd_tx,
                name,
            },
            task,
        )
    }

    /// Run a tick now and wait for its outcome
    pub async fn tick_now(&self) -> Result<TickOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::TickNow { respond_to: tx })
            .await
            .context("failed to send TickNow command")?;

        Ok(rx.await.context("failed to receive response")??)
    }

    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(MonitorCommand::UpdateInterval { interval_secs })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<TickStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::GetStats { respond_to: tx })
            .await
            .context("failed to send GetStats command")?;

        rx.await.context("failed to receive stats")
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(MonitorCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}

//! ReminderActor - sends due reminders once per matching minute
//!
//! Each tick reads the local wall clock, loads the tasks scheduled for the
//! current `HH:MM` and dispatches the ones the [`ReminderDedup`] has not seen
//! for this minute.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::monitors::reminders::{ReminderDedup, time_of_day};
use crate::notify::Notifier;
use crate::storage::ReminderStore;

use super::messages::{ReminderCommand, ReminderDispatch, TickError, TickStats};
use super::monitor::new_ticker;

/// Source of local wall-clock time
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub fn local_clock() -> Clock {
    Arc::new(|| Local::now().naive_local())
}

pub struct ReminderActor {
    subject_id: String,
    store: Arc<dyn ReminderStore>,
    notifier: Arc<Notifier>,
    dedup: ReminderDedup,
    clock: Clock,
    command_rx: mpsc::Receiver<ReminderCommand>,
    interval_duration: Duration,
    stats: TickStats,
}

impl ReminderActor {
    pub fn new(
        subject_id: String,
        store: Arc<dyn ReminderStore>,
        notifier: Arc<Notifier>,
        clock: Clock,
        interval_duration: Duration,
        command_rx: mpsc::Receiver<ReminderCommand>,
    ) -> Self {
        Self {
            subject_id,
            store,
            notifier,
            dedup: ReminderDedup::new(),
            clock,
            command_rx,
            stats: TickStats::new("reminders", interval_duration.as_secs()),
            interval_duration,
        }
    }

    #[instrument(skip(self), fields(subject = %self.subject_id))]
    pub async fn run(mut self) {
        debug!("starting reminder actor");

        let mut ticker = new_ticker(self.interval_duration);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        error!("reminder tick failed: {e}");
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        ReminderCommand::TickNow { respond_to } => {
                            let result = self.tick().await;
                            let _ = respond_to.send(result);
                        }

                        ReminderCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                            self.stats.interval_secs = interval_secs;
                            ticker = new_ticker(self.interval_duration);
                        }

                        ReminderCommand::GetStats { respond_to } => {
                            let _ = respond_to.send(self.stats.clone());
                        }

                        ReminderCommand::Shutdown => {
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

        debug!("reminder actor stopped");
    }

    async fn tick(&mut self) -> Result<Vec<ReminderDispatch>, TickError> {
        self.stats.ticks += 1;
        self.stats.last_tick = Some(Utc::now());

        let result = self.dispatch_due((self.clock)()).await;

        match &result {
            Ok(dispatches) => self.stats.reminders_sent += dispatches.len() as u64,
            Err(e) => self.stats.record_failure(e),
        }

        result
    }

    async fn dispatch_due(&self, now: NaiveDateTime) -> Result<Vec<ReminderDispatch>, TickError> {
        let tasks = self
            .store
            .list_due(&time_of_day(now))
            .await
            .map_err(TickError::Store)?;

        let mut dispatches = vec![];

        for task in self.dedup.due(&tasks, now) {
            let message = self.notifier.render_reminder(&self.subject_id, task).await;
            self.notifier.deliver(&message).await;

            info!(task = task.id, "reminder sent: {}", task.text);

            dispatches.push(ReminderDispatch {
                task: task.clone(),
                message,
                fired_at: Utc::now(),
            });
        }

        Ok(dispatches)
    }
}

/// Handle for controlling the ReminderActor
#[derive(Clone)]
pub struct ReminderHandle {
    sender: mpsc::Sender<ReminderCommand>,
}

impl ReminderHandle {
    pub fn spawn(
        subject_id: impl Into<String>,
        store: Arc<dyn ReminderStore>,
        notifier: Arc<Notifier>,
        interval_duration: Duration,
    ) -> (Self, JoinHandle<()>) {
        Self::spawn_with_clock(subject_id, store, notifier, local_clock(), interval_duration)
    }

    pub fn spawn_with_clock(
        subject_id: impl Into<String>,
        store: Arc<dyn ReminderStore>,
        notifier: Arc<Notifier>,
        clock: Clock,
        interval_duration: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = ReminderActor::new(
            subject_id.into(),
            store,
            notifier,
            clock,
            interval_duration,
            cmd_rx,
        );
        let task = tokio::spawn(actor.run());

        (Self { sender: cmd_tx }, task)
    }

    pub async fn tick_now(&self) -> Result<Vec<ReminderDispatch>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ReminderCommand::TickNow { respond_to: tx })
            .await
            .context("failed to send TickNow command")?;

        Ok(rx.await.context("failed to receive response")??)
    }

    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(ReminderCommand::UpdateInterval { interval_secs })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<TickStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ReminderCommand::GetStats { respond_to: tx })
            .await
            .context("failed to send GetStats command")?;

        rx.await.context("failed to receive stats")
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(ReminderCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}

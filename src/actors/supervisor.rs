//! Starts every loop described by the configuration and stops them together

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::monitors::dedup::DedupState;
use crate::notify::Notifier;
use crate::sources::{MotionSimulator, ReadingSource, VitalsSimulator};
use crate::storage::{EventLog, ReminderStore};

use super::messages::TickStats;
use super::monitor::{MonitorContext, MonitorHandle};
use super::reminder::ReminderHandle;

/// Cloneable view of the running actors, used by the API
#[derive(Clone, Default)]
pub struct SupervisorHandle {
    pub monitors: Vec<MonitorHandle>,
    pub reminders: Option<ReminderHandle>,
}

impl SupervisorHandle {
    /// Stats of every actor still answering
    pub async fn stats(&self) -> Vec<TickStats> {
        let mut stats = vec![];

        for monitor in &self.monitors {
            match monitor.stats().await {
                Ok(s) => stats.push(s),
                Err(e) => debug!("no stats from {}: {e:#}", monitor.name),
            }
        }

        if let Some(reminders) = &self.reminders {
            match reminders.stats().await {
                Ok(s) => stats.push(s),
                Err(e) => debug!("no stats from reminders: {e:#}"),
            }
        }

        stats
    }
}

pub struct Supervisor {
    handle: SupervisorHandle,
    tasks: Vec<JoinHandle<()>>,
    dedup: Arc<DedupState>,
}

impl Supervisor {
    pub fn new(dedup: Arc<DedupState>) -> Self {
        Self {
            handle: SupervisorHandle::default(),
            tasks: vec![],
            dedup,
        }
    }

    /// Start the health, safety and reminder loops enabled in `config`
    pub fn start(
        config: &Config,
        log: Arc<dyn EventLog>,
        store: Arc<dyn ReminderStore>,
        notifier: Arc<Notifier>,
    ) -> Self {
        let mut supervisor = Self::new(Arc::new(DedupState::new(config.cool_down())));

        let ctx = MonitorContext {
            subject_id: config.subject.id.clone(),
            display_name: config.subject.display_name(),
            thresholds: config.thresholds.clone(),
            dedup: supervisor.dedup.clone(),
            notifier: notifier.clone(),
            log,
            append_retries: config.append_retries,
        };

        if config.health.enabled {
            supervisor.add_monitor(
                "health",
                Box::new(VitalsSimulator::new()),
                ctx.clone(),
                Duration::from_secs(config.health.interval),
            );
        }

        if config.safety.enabled {
            supervisor.add_monitor(
                "safety",
                Box::new(MotionSimulator::new(config.safety.movement_probability)),
                ctx.clone(),
                Duration::from_secs(config.safety.interval),
            );
        }

        if config.reminders.enabled {
            let (handle, task) = ReminderHandle::spawn(
                ctx.subject_id.clone(),
                store,
                notifier,
                Duration::from_secs(config.reminders.interval),
            );
            supervisor.set_reminders(handle, task);
        }

        info!(
            "started {} monitor(s){}",
            supervisor.handle.monitors.len(),
            if supervisor.handle.reminders.is_some() {
                " and the reminder loop"
            } else {
                ""
            }
        );

        supervisor
    }

    pub fn add_monitor(
        &mut self,
        name: &str,
        source: Box<dyn ReadingSource>,
        ctx: MonitorContext,
        interval: Duration,
    ) -> MonitorHandle {
        let (handle, task) = MonitorHandle::spawn(name, source, ctx, interval);
        debug!("spawned {name} monitor");
        self.handle.monitors.push(handle.clone());
        self.tasks.push(task);
        handle
    }

    pub fn set_reminders(&mut self, handle: ReminderHandle, task: JoinHandle<()>) {
        self.handle.reminders = Some(handle);
        self.tasks.push(task);
    }

    pub fn handle(&self) -> SupervisorHandle {
        self.handle.clone()
    }

    pub fn dedup(&self) -> &Arc<DedupState> {
        &self.dedup
    }

    /// Send `Shutdown` to every loop and wait until all of them have exited
    pub async fn shutdown(self) -> Result<()> {
        info!("shutting down {} actor(s)", self.tasks.len());

        for monitor in &self.handle.monitors {
            if let Err(e) = monitor.shutdown().await {
                warn!("{} monitor already stopped: {e:#}", monitor.name);
            }
        }

        if let Some(reminders) = &self.handle.reminders
            && let Err(e) = reminders.shutdown().await
        {
            warn!("reminder loop already stopped: {e:#}");
        }

        for result in join_all(self.tasks).await {
            if let Err(e) = result {
                warn!("actor task ended abnormally: {e}");
            }
        }

        info!("all actors stopped");
        Ok(())
    }
}

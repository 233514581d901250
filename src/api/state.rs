//! API shared state

use std::sync::Arc;

use crate::actors::SupervisorHandle;
use crate::assistant::Assistant;
use crate::config::SubjectConfig;
use crate::notify::Notifier;
use crate::notify::channels::BannerBoard;
use crate::storage::{EventLog, ReminderStore};

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    pub log: Arc<dyn EventLog>,

    pub reminders: Arc<dyn ReminderStore>,

    /// Present when a banner channel is configured
    pub banners: Option<BannerBoard>,

    /// Renders and delivers manual alerts
    pub notifier: Arc<Notifier>,

    /// The monitored person, for manual alerts
    pub subject: SubjectConfig,

    pub assistant: Assistant,

    /// Handles to the running loops, for stats
    pub actors: SupervisorHandle,
}

impl ApiState {
    pub fn new(
        log: Arc<dyn EventLog>,
        reminders: Arc<dyn ReminderStore>,
        banners: Option<BannerBoard>,
        notifier: Arc<Notifier>,
        subject: SubjectConfig,
        actors: SupervisorHandle,
    ) -> Self {
        Self {
            log,
            reminders,
            banners,
            assistant: Assistant::new(notifier.clone()),
            notifier,
            subject,
            actors,
        }
    }
}

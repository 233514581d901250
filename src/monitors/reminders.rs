//! Minute-granularity reminder matching
//!
//! A task is due when the wall-clock `HH:MM` equals its time. The dedup key
//! is `(task_id, time)` and the stored value is the full minute stamp, so a
//! task fires at most once per matching minute and again on the next day.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::NaiveDateTime;

use crate::storage::reminders::ReminderTask;

/// Format a local wall-clock time the way reminder times are stored
pub fn time_of_day(now: NaiveDateTime) -> String {
    now.format("%H:%M").to_string()
}

fn minute_stamp(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%d %H:%M").to_string()
}

#[derive(Debug, Default)]
pub struct ReminderDedup {
    sent: Mutex<HashMap<(i64, String), String>>,
}

impl ReminderDedup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true exactly once per task and matching minute
    pub fn try_dispatch(&self, task: &ReminderTask, now: NaiveDateTime) -> bool {
        if task.time != time_of_day(now) {
            return false;
        }

        let stamp = minute_stamp(now);
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (task.id, task.time.clone());

        if sent.get(&key) == Some(&stamp) {
            return false;
        }

        sent.insert(key, stamp);
        true
    }

    /// Filter `tasks` down to those that should fire now, recording them
    pub fn due<'a>(&self, tasks: &'a [ReminderTask], now: NaiveDateTime) -> Vec<&'a ReminderTask> {
        tasks
            .iter()
            .filter(|task| self.try_dispatch(task, now))
            .collect()
    }
}

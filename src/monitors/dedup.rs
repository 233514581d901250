//! Alert deduplication
//!
//! `DedupState` remembers when an alert last fired for each
//! `(subject_id, signature)` pair and suppresses repeats inside the cool-down
//! window. Firing resets the window for that pair only.
//!
//! The state is shared by all monitor actors (`Arc<DedupState>`). Use
//! [`DedupState::try_fire`] from concurrent callers: it checks and records
//! under one lock, so two ticks racing on the same pair produce one alert.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::trace;

use super::classifier::IssueSignature;

type DedupKey = (String, IssueSignature);

#[derive(Debug)]
pub struct DedupState {
    cool_down: TimeDelta,
    fired: Mutex<HashMap<DedupKey, DateTime<Utc>>>,
}

impl DedupState {
    pub fn new(cool_down: Duration) -> Self {
        Self {
            cool_down: TimeDelta::from_std(cool_down).unwrap_or(TimeDelta::MAX),
            fired: Mutex::new(HashMap::new()),
        }
    }

    pub fn cool_down(&self) -> TimeDelta {
        self.cool_down
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DedupKey, DateTime<Utc>>> {
        // the map stays consistent even if a holder panicked
        self.fired.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allows(&self, last: Option<&DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last {
            None => true,
            Some(last) => now - *last >= self.cool_down,
        }
    }

    /// Whether an alert for this pair may fire at `now`
    pub fn should_fire(&self, subject_id: &str, signature: &IssueSignature, now: DateTime<Utc>) -> bool {
        if signature.as_str().is_empty() {
            return false;
        }

        let fired = self.lock();
        let key = (subject_id.to_string(), signature.clone());
        self.allows(fired.get(&key), now)
    }

    /// Record that an alert for this pair fired at `now`
    pub fn record_fired(&self, subject_id: &str, signature: &IssueSignature, now: DateTime<Utc>) {
        self.lock()
            .insert((subject_id.to_string(), signature.clone()), now);
    }

    /// Atomic `should_fire` + `record_fired`
    pub fn try_fire(&self, subject_id: &str, signature: &IssueSignature, now: DateTime<Utc>) -> bool {
        if signature.as_str().is_empty() {
            return false;
        }

        let mut fired = self.lock();
        let key = (subject_id.to_string(), signature.clone());

        if !self.allows(fired.get(&key), now) {
            trace!("{subject_id}: suppressing repeat alert [{signature}]");
            return false;
        }

        fired.insert(key, now);
        true
    }

    pub fn last_fired(&self, subject_id: &str, signature: &IssueSignature) -> Option<DateTime<Utc>> {
        self.lock()
            .get(&(subject_id.to_string(), signature.clone()))
            .copied()
    }

    /// Drop records whose window has elapsed; returns how many were removed
    pub fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut fired = self.lock();
        let before = fired.len();
        fired.retain(|_, last| now - *last < self.cool_down);
        before - fired.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn reset(&self) {
        self.lock().clear();
    }
}

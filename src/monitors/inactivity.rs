use chrono::{DateTime, TimeDelta, Utc};

/// Tracks the time since the last observed movement.
///
/// After an inactivity alert fires the tracker is reset to the firing time,
/// so continued inactivity alerts again once the threshold elapses anew.
#[derive(Debug, Clone, Copy)]
pub struct MotionTracker {
    last_movement: DateTime<Utc>,
}

impl MotionTracker {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { last_movement: now }
    }

    pub fn last_movement(&self) -> DateTime<Utc> {
        self.last_movement
    }

    /// Feed one observation and return how long the subject has been still
    pub fn observe(&mut self, moved: bool, now: DateTime<Utc>) -> TimeDelta {
        if moved {
            self.last_movement = now;
        }
        self.inactive_for(now)
    }

    pub fn inactive_for(&self, now: DateTime<Utc>) -> TimeDelta {
        (now - self.last_movement).max(TimeDelta::zero())
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.last_movement = now;
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::trace;

use super::{ReadingSource, SourceError};
use crate::{Issue, IssueSet, Sample, SourceKind, metric, monitors::inactivity::MotionTracker};

/// Simulated movement sensor
///
/// Each tick detects movement with the configured probability and reports
/// the number of seconds since the last detected movement.
pub struct MotionSimulator {
    rng: StdRng,
    movement_probability: f64,
    tracker: MotionTracker,
}

impl MotionSimulator {
    pub fn new(movement_probability: f64) -> Self {
        Self::with_rng(movement_probability, StdRng::from_entropy())
    }

    pub fn with_seed(movement_probability: f64, seed: u64) -> Self {
        Self::with_rng(movement_probability, StdRng::seed_from_u64(seed))
    }

    fn with_rng(movement_probability: f64, rng: StdRng) -> Self {
        Self {
            rng,
            movement_probability: movement_probability.clamp(0.0, 1.0),
            tracker: MotionTracker::new(Utc::now()),
        }
    }

    pub fn last_movement(&self) -> DateTime<Utc> {
        self.tracker.last_movement()
    }
}

#[async_trait]
impl ReadingSource for MotionSimulator {
    fn kind(&self) -> SourceKind {
        SourceKind::Safety
    }

    async fn next_sample(&mut self, subject_id: &str) -> Result<Sample, SourceError> {
        let now = Utc::now();
        let moved = self.rng.gen_bool(self.movement_probability);
        let inactive = self.tracker.observe(moved, now);

        trace!(
            "{subject_id}: movement={moved}, inactive for {}s",
            inactive.num_seconds()
        );

        Ok(Sample::new(
            subject_id,
            SourceKind::Safety,
            now,
            [
                (metric::MOVEMENT.to_string(), if moved { 1.0 } else { 0.0 }),
                (
                    metric::INACTIVE_SECS.to_string(),
                    inactive.num_milliseconds() as f64 / 1000.0,
                ),
            ],
        ))
    }

    fn alert_fired(&mut self, issues: &IssueSet, at: DateTime<Utc>) {
        if issues.contains(Issue::Inactivity) {
            self.tracker.reset(at);
        }
    }
}

use async_trait::async_trait;
use chrono::Utc;
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{ReadingSource, SourceError};
use crate::{Sample, SourceKind, metric};

/// Random vitals in a range that regularly crosses the default thresholds
pub struct VitalsSimulator {
    rng: StdRng,
}

impl VitalsSimulator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for VitalsSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingSource for VitalsSimulator {
    fn kind(&self) -> SourceKind {
        SourceKind::Health
    }

    async fn next_sample(&mut self, subject_id: &str) -> Result<Sample, SourceError> {
        let readings = [
            (metric::HEART_RATE, self.rng.gen_range(55..=110)),
            (metric::BP_SYS, self.rng.gen_range(90..=160)),
            (metric::BP_DIA, self.rng.gen_range(60..=100)),
            (metric::GLUCOSE, self.rng.gen_range(70..=180)),
        ];

        Ok(Sample::new(
            subject_id,
            SourceKind::Health,
            Utc::now(),
            readings
                .into_iter()
                .map(|(name, value)| (name.to_string(), f64::from(value))),
        ))
    }
}

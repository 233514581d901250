//! Reading sources
//!
//! A reading source produces one [`Sample`] per tick. The bundled sources
//! simulate data; a production deployment plugs in a real sensor feed by
//! implementing [`ReadingSource`].

pub mod motion;
pub mod replay;
pub mod vitals;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{IssueSet, Sample, SourceKind};

pub use motion::MotionSimulator;
pub use replay::ReplaySource;
pub use vitals::VitalsSimulator;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not produce a sample this tick
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ReadingSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn next_sample(&mut self, subject_id: &str) -> Result<Sample, SourceError>;

    /// Called after an alert derived from this source's sample was fired
    fn alert_fired(&mut self, _issues: &IssueSet, _at: DateTime<Utc>) {}
}

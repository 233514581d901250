use std::collections::{BTreeMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;

use super::{ReadingSource, SourceError};
use crate::{Sample, SourceKind};

/// Replays a fixed sequence of readings, one per tick.
///
/// Outages can be scheduled with [`ReplaySource::push_outage`]; once the
/// sequence is exhausted every tick reports the source as unavailable.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    kind: SourceKind,
    readings: VecDeque<Option<BTreeMap<String, f64>>>,
}

impl ReplaySource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            readings: VecDeque::new(),
        }
    }

    pub fn push<'a>(mut self, metrics: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        self.readings.push_back(Some(
            metrics
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        ));
        self
    }

    pub fn push_outage(mut self) -> Self {
        self.readings.push_back(None);
        self
    }

    pub fn remaining(&self) -> usize {
        self.readings.len()
    }
}

#[async_trait]
impl ReadingSource for ReplaySource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn next_sample(&mut self, subject_id: &str) -> Result<Sample, SourceError> {
        match self.readings.pop_front() {
            Some(Some(metrics)) => Ok(Sample::new(subject_id, self.kind, Utc::now(), metrics)),
            Some(None) => Err(SourceError::Unavailable("scheduled outage".to_string())),
            None => Err(SourceError::Unavailable("replay exhausted".to_string())),
        }
    }
}

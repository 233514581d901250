pub mod actors;
#[cfg(feature = "api")]
pub mod api;
pub mod assistant;
pub mod config;
pub mod monitors;
pub mod notify;
pub mod sources;
pub mod storage;
pub mod util;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use monitors::classifier::{Issue, IssueSet};

/// Metric keys produced by the bundled sources
pub mod metric {
    pub const HEART_RATE: &str = "heart_rate";
    pub const BP_SYS: &str = "bp_sys";
    pub const BP_DIA: &str = "bp_dia";
    pub const GLUCOSE: &str = "glucose";
    pub const INACTIVE_SECS: &str = "inactive_secs";
    pub const MOVEMENT: &str = "movement";
}

/// Which monitoring loop produced a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Health,
    Safety,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Health => write!(f, "health"),
            SourceKind::Safety => write!(f, "safety"),
        }
    }
}

/// One timestamped set of metric readings for a subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub subject_id: String,
    pub source: SourceKind,
    pub metrics: BTreeMap<String, f64>,
}

impl Sample {
    pub fn new(
        subject_id: impl Into<String>,
        source: SourceKind,
        timestamp: DateTime<Utc>,
        metrics: impl IntoIterator<Item = (String, f64)>,
    ) -> Self {
        Self {
            timestamp,
            subject_id: subject_id.into(),
            source,
            metrics: metrics.into_iter().collect(),
        }
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Compact one-line rendering of the readings, e.g. `bp_dia=80, heart_rate=72`
    pub fn summary(&self) -> String {
        self.metrics
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

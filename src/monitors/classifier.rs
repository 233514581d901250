//! Threshold classifier for samples
//!
//! `classify` is a pure function of a sample and the configured thresholds:
//!
//! ```text
//! heart_rate < min || heart_rate > max   → abnormal_heart_rate
//! bp_sys > max     || bp_dia > max       → high_blood_pressure
//! glucose > max                          → elevated_glucose
//! inactive_secs > max                    → inactivity
//! ```
//!
//! Bounds are exclusive, so a reading sitting exactly on a bound is normal.
//! Missing metrics never raise an issue, and every matching rule is reported.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Sample, config::Thresholds, metric};

/// A classified abnormal condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Issue {
    AbnormalHeartRate,
    HighBloodPressure,
    ElevatedGlucose,
    Inactivity,
}

impl Issue {
    /// Stable code used in logs and dedup signatures
    pub fn code(&self) -> &'static str {
        match self {
            Issue::AbnormalHeartRate => "abnormal_heart_rate",
            Issue::HighBloodPressure => "high_blood_pressure",
            Issue::ElevatedGlucose => "elevated_glucose",
            Issue::Inactivity => "inactivity",
        }
    }

    /// Human readable description for messages
    pub fn description(&self) -> &'static str {
        match self {
            Issue::AbnormalHeartRate => "abnormal heart rate",
            Issue::HighBloodPressure => "high blood pressure",
            Issue::ElevatedGlucose => "elevated glucose level",
            Issue::Inactivity => "no movement detected for a prolonged time",
        }
    }

    /// Metrics that are relevant for explaining this issue
    pub fn metrics(&self) -> &'static [&'static str] {
        match self {
            Issue::AbnormalHeartRate => &[metric::HEART_RATE],
            Issue::HighBloodPressure => &[metric::BP_SYS, metric::BP_DIA],
            Issue::ElevatedGlucose => &[metric::GLUCOSE],
            Issue::Inactivity => &[metric::INACTIVE_SECS],
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Ordered set of issues; iteration order is canonical
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueSet(BTreeSet<Issue>);

impl IssueSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, issue: Issue) -> bool {
        self.0.insert(issue)
    }

    pub fn contains(&self, issue: Issue) -> bool {
        self.0.contains(&issue)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.0.iter()
    }

    /// Order-independent dedup key: the issue codes sorted by name, comma-joined
    pub fn signature(&self) -> IssueSignature {
        let mut codes: Vec<_> = self.0.iter().map(Issue::code).collect();
        codes.sort_unstable();
        IssueSignature(codes.join(","))
    }

    pub fn descriptions(&self) -> Vec<&'static str> {
        self.0.iter().map(Issue::description).collect()
    }
}

impl FromIterator<Issue> for IssueSet {
    fn from_iter<T: IntoIterator<Item = Issue>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a IssueSet {
    type Item = &'a Issue;
    type IntoIter = std::collections::btree_set::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Repeat-suppression key derived from an issue set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueSignature(String);

impl IssueSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Overall status of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Critical,
}

impl Status {
    pub fn of(issues: &IssueSet) -> Status {
        if issues.is_empty() {
            Status::Normal
        } else {
            Status::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Normal => "normal",
            Status::Critical => "critical",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the issues present in a sample
pub fn classify(sample: &Sample, thresholds: &Thresholds) -> IssueSet {
    let mut issues = IssueSet::new();

    if let Some(heart_rate) = sample.metric(metric::HEART_RATE)
        && (heart_rate < thresholds.heart_rate_min || heart_rate > thresholds.heart_rate_max)
    {
        issues.insert(Issue::AbnormalHeartRate);
    }

    let bp_sys_high = sample
        .metric(metric::BP_SYS)
        .is_some_and(|value| value > thresholds.bp_sys_max);
    let bp_dia_high = sample
        .metric(metric::BP_DIA)
        .is_some_and(|value| value > thresholds.bp_dia_max);
    if bp_sys_high || bp_dia_high {
        issues.insert(Issue::HighBloodPressure);
    }

    if sample
        .metric(metric::GLUCOSE)
        .is_some_and(|value| value > thresholds.glucose_max)
    {
        issues.insert(Issue::ElevatedGlucose);
    }

    if sample
        .metric(metric::INACTIVE_SECS)
        .is_some_and(|value| value > thresholds.inactivity_secs)
    {
        issues.insert(Issue::Inactivity);
    }

    issues
}

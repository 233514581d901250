//! Prompts for the text generator and the deterministic fallback texts

use crate::{Issue, IssueSet, Sample, SourceKind, metric, storage::reminders::ReminderTask};

pub const CHAT_FALLBACK: &str =
    "Sorry, I had trouble responding just now. Please try again in a moment.";

fn readings_for(issue: &Issue, sample: &Sample) -> String {
    issue
        .metrics()
        .iter()
        .filter_map(|name| sample.metric(name).map(|value| format!("{name}={value}")))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe(issues: &IssueSet, sample: &Sample) -> String {
    issues
        .iter()
        .map(|issue| {
            let readings = readings_for(issue, sample);
            if readings.is_empty() {
                issue.description().to_string()
            } else {
                format!("{} ({readings})", issue.description())
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn alert_title(subject: &str, sample: &Sample) -> String {
    match sample.source {
        SourceKind::Health => format!("Health alert for {subject}"),
        SourceKind::Safety => format!("Safety alert for {subject}"),
    }
}

pub fn alert_prompt(subject: &str, issues: &IssueSet, sample: &Sample) -> String {
    format!(
        "You're a helpful and calming assistant. Notify the caregiver that {subject} is showing: {}. \
         Keep the tone soft and reassuring and suggest checking on them.",
        describe(issues, sample)
    )
}

pub fn alert_message(subject: &str, issues: &IssueSet, sample: &Sample) -> String {
    format!(
        "Alert for {subject}: {}. Please check on them.",
        describe(issues, sample)
    )
}

/// Title of an alert raised by hand from the dashboard or the CLI
pub fn manual_alert_title(subject: &str) -> String {
    format!("Manual safety alert for {subject}")
}

pub fn manual_alert_prompt(subject: &str, reason: &str) -> String {
    format!(
        "You are a caring assistant. Kindly alert the caregiver about {subject}: '{reason}'. \
         Make sure your message is polite, calm and helpful."
    )
}

pub fn manual_alert_message(subject: &str, reason: &str) -> String {
    format!("Alert for {subject}: {reason}. Please check on them.")
}

/// Log text for a tick whose alert was suppressed by the cool-down
pub fn ongoing_message(subject: &str, issues: &IssueSet, sample: &Sample) -> String {
    format!(
        "Ongoing for {subject}: {} (caregiver already notified).",
        describe(issues, sample)
    )
}

pub fn normal_message(sample: &Sample) -> String {
    match sample.source {
        SourceKind::Health => "All vitals normal.".to_string(),
        SourceKind::Safety => match sample.metric(metric::MOVEMENT) {
            Some(moved) if moved > 0.0 => "Movement detected.".to_string(),
            _ => match sample.metric(metric::INACTIVE_SECS) {
                Some(secs) => format!("No movement for {secs:.0}s."),
                None => "No movement detected.".to_string(),
            },
        },
    }
}

pub fn reminder_title(task: &ReminderTask) -> String {
    format!("Reminder: {}", task.text)
}

pub fn reminder_prompt(task: &ReminderTask) -> String {
    format!(
        "You're a friendly virtual assistant for an elderly person. \
         Kindly remind them: '{}' in a gentle and cheerful tone.",
        task.text
    )
}

pub fn reminder_message(task: &ReminderTask) -> String {
    format!(
        "Hi there! Just a gentle reminder: '{}' is scheduled for {}.",
        task.text, task.time
    )
}

pub fn chat_prompt(input: &str) -> String {
    format!(
        "You're a warm, friendly assistant designed to support elderly users. \
         Respond kindly and cheerfully to: '{input}'"
    )
}

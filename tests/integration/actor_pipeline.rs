//! End-to-end tests of the monitoring pipeline: source, classifier,
//! deduplication, notification and event log

use std::sync::Arc;
use std::time::Duration;

use carewatch::{
    Issue, IssueSet, SourceKind,
    actors::TickOutcome,
    metric,
    monitors::classifier::Status,
    notify::{MessageOrigin, Notifier, Severity},
    storage::{EventLog, memory::MemoryEventLog},
};
use pretty_assertions::assert_eq;

use crate::helpers::*;

const COOL_DOWN: Duration = Duration::from_secs(120);

#[tokio::test]
async fn test_fast_heart_rate_fires_one_alert() {
    let log = Arc::new(MemoryEventLog::new());
    let channel = Arc::new(RecordingChannel::default());
    let notifier = Arc::new(Notifier::new().with_channel(channel.clone()));

    let source = replay(SourceKind::Health).push(vitals(120.0, 130.0, 80.0, 90.0));
    let (handle, task) = spawn_monitor("health", source, context(log.clone(), notifier, COOL_DOWN)).await;

    let outcome = handle.tick_now().await.unwrap();
    let entry = outcome.entry().unwrap();

    assert_eq!(entry.issues, IssueSet::from_iter([Issue::AbnormalHeartRate]));
    assert_eq!(entry.status, Status::Critical);
    assert!(outcome.fired());

    let alert = entry.alert.as_ref().unwrap();
    assert_eq!(alert.signature.as_str(), "abnormal_heart_rate");
    assert_eq!(alert.subject_id, "resident-1");

    let delivered = channel.messages();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].severity, Severity::Critical);
    assert_eq!(delivered[0].origin, MessageOrigin::Template);
    assert_eq!(delivered[0].body, entry.message);
    assert!(delivered[0].body.contains("heart_rate=120"));

    // warm-up entry plus the alert
    assert_eq!(log.len().await.unwrap(), 2);
    assert_eq!(log.alerts(10).await.unwrap().len(), 1);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_high_blood_pressure_only() {
    let log = Arc::new(MemoryEventLog::new());
    let notifier = Arc::new(Notifier::new());

    let source = replay(SourceKind::Health).push(vitals(75.0, 150.0, 95.0, 100.0));
    let (handle, task) = spawn_monitor("health", source, context(log.clone(), notifier, COOL_DOWN)).await;

    let outcome = handle.tick_now().await.unwrap();
    let entry = outcome.entry().unwrap();

    assert_eq!(entry.issues, IssueSet::from_iter([Issue::HighBloodPressure]));
    assert_eq!(entry.status, Status::Critical);
    assert!(outcome.fired());

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_repeated_inactivity_is_suppressed_within_cool_down() {
    let log = Arc::new(MemoryEventLog::new());
    let channel = Arc::new(RecordingChannel::default());
    let notifier = Arc::new(Notifier::new().with_channel(channel.clone()));

    let source = replay(SourceKind::Safety)
        .push([(metric::MOVEMENT, 0.0), (metric::INACTIVE_SECS, 150.0)])
        .push([(metric::MOVEMENT, 0.0), (metric::INACTIVE_SECS, 180.0)]);
    let (handle, task) = spawn_monitor("safety", source, context(log.clone(), notifier, COOL_DOWN)).await;

    let first = handle.tick_now().await.unwrap();
    let second = handle.tick_now().await.unwrap();

    assert!(first.fired());
    assert!(second.suppressed());

    let second = second.entry().unwrap();
    assert_eq!(second.issues, IssueSet::from_iter([Issue::Inactivity]));
    assert!(second.message.starts_with("Ongoing for resident-1"));

    assert_eq!(channel.messages().len(), 1);
    assert_eq!(log.alerts(10).await.unwrap().len(), 1);

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.alerts_fired, 1);
    assert_eq!(stats.alerts_suppressed, 1);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_alert_fires_again_once_cool_down_elapsed() {
    let log = Arc::new(MemoryEventLog::new());
    let channel = Arc::new(RecordingChannel::default());
    let notifier = Arc::new(Notifier::new().with_channel(channel.clone()));

    let source = replay(SourceKind::Health)
        .push(vitals(72.0, 120.0, 80.0, 170.0))
        .push(vitals(72.0, 120.0, 80.0, 175.0));
    let (handle, task) =
        spawn_monitor("health", source, context(log.clone(), notifier, Duration::ZERO)).await;

    assert!(handle.tick_now().await.unwrap().fired());
    assert!(handle.tick_now().await.unwrap().fired());
    assert_eq!(channel.messages().len(), 2);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_different_signature_is_not_suppressed() {
    let log = Arc::new(MemoryEventLog::new());
    let notifier = Arc::new(Notifier::new());

    let source = replay(SourceKind::Health)
        .push(vitals(120.0, 120.0, 80.0, 100.0))
        .push(vitals(120.0, 150.0, 80.0, 100.0));
    let (handle, task) = spawn_monitor("health", source, context(log.clone(), notifier, COOL_DOWN)).await;

    let first = handle.tick_now().await.unwrap();
    let second = handle.tick_now().await.unwrap();

    assert!(first.fired());
    assert!(second.fired());
    assert_eq!(
        second.entry().unwrap().alert.as_ref().unwrap().signature.as_str(),
        "abnormal_heart_rate,high_blood_pressure"
    );

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_generated_alert_text_is_logged() {
    let log = Arc::new(MemoryEventLog::new());
    let generator = Arc::new(FixedGenerator::new(Some("Please check on Rose.")));
    let notifier = Arc::new(
        Notifier::new().with_generator(generator.clone(), Duration::from_secs(5)),
    );

    let source = replay(SourceKind::Health).push(vitals(72.0, 120.0, 80.0, 170.0));
    let (handle, task) = spawn_monitor("health", source, context(log.clone(), notifier, COOL_DOWN)).await;

    let outcome = handle.tick_now().await.unwrap();

    assert_eq!(outcome.entry().unwrap().message, "Please check on Rose.");
    // the normal warm-up reading never reaches the generator
    assert_eq!(generator.calls(), 1);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_entries_are_logged_in_tick_order() {
    let log = Arc::new(MemoryEventLog::new());
    let notifier = Arc::new(Notifier::new());

    let glucose = [101.0, 102.0, 103.0, 104.0, 105.0];
    let source = glucose
        .iter()
        .fold(replay(SourceKind::Health), |source, value| {
            source.push(vitals(72.0, 120.0, 80.0, *value))
        });
    let (handle, task) = spawn_monitor("health", source, context(log.clone(), notifier, COOL_DOWN)).await;

    for _ in glucose {
        let outcome = handle.tick_now().await.unwrap();
        assert!(matches!(outcome, TickOutcome::Logged(_)));
    }

    let entries = log.tail(glucose.len()).await.unwrap();
    let logged: Vec<f64> = entries
        .iter()
        .map(|entry| entry.sample.metric(metric::GLUCOSE).unwrap())
        .collect();
    assert_eq!(logged, glucose.to_vec());
    assert!(entries.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));

    assert_eq!(handle.stats().await.unwrap().ticks, glucose.len() as u64 + 1);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

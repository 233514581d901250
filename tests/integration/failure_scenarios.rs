//! Failure handling: source outages, event log errors and broken channels

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use assert_matches::assert_matches;
use carewatch::{
    SourceKind,
    actors::{TickError, TickOutcome},
    notify::{Message, MessageOrigin, Notifier, Severity, channels::ChannelError},
    storage::{EventLog, memory::MemoryEventLog},
};

use crate::helpers::*;

const COOL_DOWN: Duration = Duration::from_secs(120);

#[tokio::test]
async fn test_outage_skips_tick_without_logging() {
    let log = Arc::new(MemoryEventLog::new());
    let notifier = Arc::new(Notifier::new());

    let source = replay(SourceKind::Health)
        .push_outage()
        .push(vitals(72.0, 120.0, 80.0, 100.0));
    let (handle, task) = spawn_monitor("health", source, context(log.clone(), notifier, COOL_DOWN)).await;

    let skipped = handle.tick_now().await.unwrap();
    assert_matches!(skipped, TickOutcome::Skipped { reason } if reason.contains("scheduled outage"));
    assert_eq!(log.len().await.unwrap(), 1);

    // the loop recovers on the next tick
    let logged = handle.tick_now().await.unwrap();
    assert!(logged.entry().is_some());
    assert_eq!(log.len().await.unwrap(), 2);

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.skipped_ticks, 1);
    assert_eq!(stats.failed_ticks, 0);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_append_is_retried_until_it_succeeds() {
    let log = Arc::new(FlakyLog::new(2));
    let notifier = Arc::new(Notifier::new());

    // append_retries = 2, so the warm-up tick succeeds on its third attempt
    let (handle, task) =
        spawn_monitor("health", replay(SourceKind::Health), context(log.clone(), notifier, COOL_DOWN)).await;

    assert_eq!(log.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(log.len().await.unwrap(), 1);
    assert_eq!(handle.stats().await.unwrap().failed_ticks, 0);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_exhausted_retries_fail_the_tick_but_not_the_loop() {
    // warm-up tick and the first explicit tick both exhaust their retries
    let log = Arc::new(FlakyLog::new(6));
    let notifier = Arc::new(Notifier::new());

    let source = replay(SourceKind::Health)
        .push(vitals(72.0, 120.0, 80.0, 100.0))
        .push(vitals(72.0, 120.0, 80.0, 100.0));
    let (handle, task) = spawn_monitor("health", source, context(log.clone(), notifier, COOL_DOWN)).await;

    let error = handle.tick_now().await.unwrap_err();
    assert_matches!(
        error.downcast_ref::<TickError>(),
        Some(TickError::Persistence { attempts: 3, .. })
    );

    let outcome = handle.tick_now().await.unwrap();
    assert!(outcome.entry().is_some());
    assert_eq!(log.len().await.unwrap(), 1);

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.ticks, 3);
    assert_eq!(stats.failed_ticks, 2);
    assert!(stats.last_error.unwrap().contains("disk full"));

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_failing_channel_does_not_block_others() {
    let log = Arc::new(MemoryEventLog::new());
    let recording = Arc::new(RecordingChannel::default());
    let notifier = Arc::new(
        Notifier::new()
            .with_channel(Arc::new(FailingChannel))
            .with_channel(recording.clone()),
    );

    let source = replay(SourceKind::Health).push(vitals(130.0, 120.0, 80.0, 100.0));
    let (handle, task) = spawn_monitor("health", source, context(log.clone(), notifier, COOL_DOWN)).await;

    let outcome = handle.tick_now().await.unwrap();

    assert!(outcome.fired());
    assert_eq!(recording.messages().len(), 1);
    assert_eq!(log.alerts(10).await.unwrap().len(), 1);

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_stuck_channel_times_out() {
    let recording = Arc::new(RecordingChannel::default());
    let notifier = Notifier::new()
        .with_channel(Arc::new(StuckChannel))
        .with_channel(recording.clone())
        .with_delivery_timeout(Duration::from_millis(50));

    let message = Message::new(
        "resident-1",
        "Reminder: Take medicine",
        "Hi there!",
        Severity::Info,
        MessageOrigin::Template,
    );

    let results = notifier.deliver(&message).await;

    assert_eq!(results.len(), 2);
    assert_matches!(
        results.iter().find(|(name, _)| *name == "stuck"),
        Some((_, Err(ChannelError::Timeout)))
    );
    assert_eq!(recording.messages().len(), 1);
}

#[tokio::test]
async fn test_failing_generator_falls_back_to_template() {
    let log = Arc::new(MemoryEventLog::new());
    let generator = Arc::new(FixedGenerator::new(None));
    let notifier = Arc::new(
        Notifier::new().with_generator(generator.clone(), Duration::from_secs(5)),
    );

    let source = replay(SourceKind::Health).push(vitals(72.0, 120.0, 80.0, 170.0));
    let (handle, task) = spawn_monitor("health", source, context(log.clone(), notifier, COOL_DOWN)).await;

    let outcome = handle.tick_now().await.unwrap();
    let entry = outcome.entry().unwrap();

    assert_eq!(generator.calls(), 1);
    assert!(entry.message.starts_with("Alert for resident-1"));
    assert!(outcome.fired());

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

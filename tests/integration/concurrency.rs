//! Concurrent access to shared dedup state, the event log and the actors

use std::sync::Arc;
use std::time::Duration;

use carewatch::{
    Issue, IssueSet, Sample, SourceKind,
    actors::{MonitorContext, MonitorHandle, Supervisor},
    config::parse_config,
    metric,
    monitors::dedup::DedupState,
    notify::Notifier,
    storage::{
        EventLog, LogEntry, jsonl::JsonLinesEventLog, memory::MemoryEventLog,
        reminders::MemoryReminderStore,
    },
};
use chrono::Utc;
use futures::future::join_all;
use tempfile::TempDir;

use crate::helpers::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_try_fire_admits_exactly_one() {
    let dedup = Arc::new(DedupState::new(Duration::from_secs(120)));
    let signature = IssueSet::from_iter([Issue::Inactivity]).signature();
    let now = Utc::now();

    let attempts = (0..32).map(|_| {
        let dedup = dedup.clone();
        let signature = signature.clone();
        tokio::spawn(async move { dedup.try_fire("resident-1", &signature, now) })
    });

    let fired = join_all(attempts)
        .await
        .into_iter()
        .filter(|result| *result.as_ref().unwrap())
        .count();

    assert_eq!(fired, 1);
    assert_eq!(dedup.last_fired("resident-1", &signature), Some(now));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_monitors_share_dedup_state() {
    let log = Arc::new(MemoryEventLog::new());
    let notifier = Arc::new(Notifier::new());
    let ctx = context(log.clone(), notifier, Duration::from_secs(120));

    // two loops observing the same subject raise the same signature
    let (first, first_task) = spawn_monitor(
        "health-a",
        replay(SourceKind::Health).push(vitals(72.0, 120.0, 80.0, 170.0)),
        ctx.clone(),
    )
    .await;
    let (second, second_task) = spawn_monitor(
        "health-b",
        replay(SourceKind::Health).push(vitals(72.0, 120.0, 80.0, 180.0)),
        ctx,
    )
    .await;

    let (a, b) = tokio::join!(first.tick_now(), second.tick_now());
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!([a.fired(), b.fired()].iter().filter(|f| **f).count(), 1);
    assert_eq!([a.suppressed(), b.suppressed()].iter().filter(|s| **s).count(), 1);
    assert_eq!(log.alerts(10).await.unwrap().len(), 1);

    first.shutdown().await.unwrap();
    second.shutdown().await.unwrap();
    first_task.await.unwrap();
    second_task.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_alert_does_not_break_timestamp_order() {
    let log = Arc::new(MemoryEventLog::new());
    let cool_down = Duration::from_secs(120);

    let slow = Notifier::new().with_generator(
        Arc::new(FixedGenerator::new(Some("Please check on Rose.")).with_delay(Duration::from_millis(300))),
        Duration::from_secs(5),
    );
    let health_ctx = MonitorContext {
        notifier: Arc::new(slow),
        ..context(log.clone(), Arc::new(Notifier::new()), cool_down)
    };
    let safety_ctx = context(log.clone(), Arc::new(Notifier::new()), cool_down);

    let (health, health_task) = spawn_monitor(
        "health",
        replay(SourceKind::Health).push(vitals(130.0, 120.0, 80.0, 100.0)),
        health_ctx,
    )
    .await;
    let (safety, safety_task) = spawn_monitor(
        "safety",
        replay(SourceKind::Safety).push([(metric::MOVEMENT, 1.0), (metric::INACTIVE_SECS, 0.0)]),
        safety_ctx,
    )
    .await;

    // the health tick samples first but appends last
    let pending = {
        let health = health.clone();
        tokio::spawn(async move { health.tick_now().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    safety.tick_now().await.unwrap();
    assert!(pending.await.unwrap().unwrap().fired());

    let entries = log.tail(10).await.unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
    assert_eq!(entries[3].sample.source, SourceKind::Safety);
    assert!(entries[2].alert.is_some());

    let since = log.since(entries[2].timestamp()).await.unwrap();
    assert_eq!(since.len(), 2);

    health.shutdown().await.unwrap();
    safety.shutdown().await.unwrap();
    health_task.await.unwrap();
    safety_task.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_keep_every_line() {
    let dir = TempDir::new().unwrap();
    let log = Arc::new(
        JsonLinesEventLog::open(dir.path().join("health_log.jsonl"))
            .await
            .unwrap(),
    );

    let writers = (0..20).map(|i| {
        let log = log.clone();
        tokio::spawn(async move {
            let sample = Sample::new(
                format!("resident-{i}"),
                SourceKind::Health,
                Utc::now(),
                [("heart_rate".to_string(), 70.0 + i as f64)],
            );
            log.append(LogEntry::new(sample, IssueSet::new(), "All vitals normal."))
                .await
        })
    });

    for result in join_all(writers).await {
        result.unwrap().unwrap();
    }

    let reopened = JsonLinesEventLog::open(dir.path().join("health_log.jsonl"))
        .await
        .unwrap();
    assert_eq!(reopened.len().await.unwrap(), 20);
}

#[tokio::test]
async fn test_supervisor_shutdown_stops_every_loop() {
    let config = parse_config(
        r#"{
            "health": { "interval": 3600 },
            "safety": { "interval": 3600 },
            "reminders": { "interval": 3600 }
        }"#,
    )
    .unwrap();

    let log = Arc::new(MemoryEventLog::new());
    let supervisor = Supervisor::start(
        &config,
        log.clone(),
        Arc::new(MemoryReminderStore::new()),
        Arc::new(Notifier::new()),
    );
    let handle = supervisor.handle();

    let names: Vec<String> = handle.stats().await.into_iter().map(|s| s.name).collect();
    assert_eq!(names.len(), 3);
    assert!(names.contains(&"health".to_string()));
    assert!(names.contains(&"safety".to_string()));

    let health: &MonitorHandle = handle.monitors.iter().find(|m| m.name == "health").unwrap();
    health.tick_now().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), supervisor.shutdown())
        .await
        .expect("shutdown should finish")
        .unwrap();

    assert!(health.tick_now().await.is_err());
    assert!(handle.stats().await.is_empty());
}

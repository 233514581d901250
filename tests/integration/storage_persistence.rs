//! Integration tests for storage persistence
//!
//! These tests verify that:
//! - Entries written by a monitor survive reopening the event log
//! - Both file backends are reachable through the storage config
//! - Reminders persist in SQLite and are matched by time of day

use std::sync::Arc;
use std::time::Duration;

use carewatch::{
    Issue, IssueSet, SourceKind,
    config::{ReminderStoreConfig, StorageConfig},
    notify::Notifier,
    storage::{EventLog, open_event_log, open_reminder_store, sqlite::SqliteEventLog},
};
use chrono::Utc;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use crate::helpers::*;

#[tokio::test]
async fn test_monitor_entries_survive_reopen() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("event_log.db");
    let started = Utc::now();

    let log = Arc::new(SqliteEventLog::open(&db_path).await.unwrap());
    let source = replay(SourceKind::Health)
        .push(vitals(120.0, 130.0, 80.0, 90.0))
        .push(vitals(125.0, 130.0, 80.0, 90.0));
    let (handle, task) = spawn_monitor(
        "health",
        source,
        context(log.clone(), Arc::new(Notifier::new()), Duration::from_secs(120)),
    )
    .await;

    handle.tick_now().await.unwrap();
    handle.tick_now().await.unwrap();
    handle.shutdown().await.unwrap();
    task.await.unwrap();
    log.close().await;

    let reopened = SqliteEventLog::open(&db_path).await.unwrap();
    assert_eq!(reopened.len().await.unwrap(), 3);

    let alerts = reopened.alerts(10).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].issues, IssueSet::from_iter([Issue::AbnormalHeartRate]));

    let tail = reopened.tail(2).await.unwrap();
    assert!(tail[0].alert.is_some());
    assert!(tail[1].alert.is_none());
    assert!(tail[1].message.starts_with("Ongoing for resident-1"));

    assert_eq!(reopened.since(started).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_configured_backends_persist() {
    let temp_dir = tempdir().unwrap();

    for config in [
        StorageConfig::Jsonl {
            path: temp_dir.path().join("logs/health_log.jsonl"),
        },
        StorageConfig::Sqlite {
            path: temp_dir.path().join("db/event_log.db"),
        },
    ] {
        let log = open_event_log(&config).await.unwrap();
        let (handle, task) = spawn_monitor(
            "health",
            replay(SourceKind::Health).push(vitals(72.0, 120.0, 80.0, 170.0)),
            context(log.clone(), Arc::new(Notifier::new()), Duration::from_secs(120)),
        )
        .await;

        assert!(handle.tick_now().await.unwrap().fired());
        handle.shutdown().await.unwrap();
        task.await.unwrap();
        let backend = log.name();
        drop(log);

        let reopened = open_event_log(&config).await.unwrap();
        assert_eq!(reopened.name(), backend);
        assert_eq!(reopened.len().await.unwrap(), 2, "{backend}");
        assert_eq!(reopened.alerts(5).await.unwrap().len(), 1, "{backend}");
        assert!(reopened.health_check().await.unwrap().healthy);
    }
}

#[tokio::test]
async fn test_reminders_persist_across_reopen() {
    let temp_dir = tempdir().unwrap();
    let config = ReminderStoreConfig {
        path: Some(temp_dir.path().join("reminders.db")),
    };

    let store = open_reminder_store(&config).await.unwrap();
    let medicine = store.create("Take your 10 AM medicine", "10:00").await.unwrap();
    store.create("Drink a glass of water", "09:30").await.unwrap();
    let walk = store.create("Go for a short walk", "16:00").await.unwrap();
    store.delete(walk.id).await.unwrap();
    drop(store);

    let store = open_reminder_store(&config).await.unwrap();

    let times: Vec<String> = store.list().await.unwrap().into_iter().map(|t| t.time).collect();
    assert_eq!(times, vec!["09:30", "10:00"]);

    let due = store.list_due("10:00").await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, medicine.id);
    assert!(store.list_due("16:00").await.unwrap().is_empty());
}

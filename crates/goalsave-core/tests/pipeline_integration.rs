//! End-to-end tests for the monitoring pipeline on a file-backed database.
//!
//! Each test drives a `MonitorEngine` the way a host would, then reopens the
//! database to check what a later process would see.

use std::sync::{Arc, Mutex};

use chrono::Duration;
use goalsave_core::storage::KeyValueStore;
use goalsave_core::{
    Clock, Config, Database, GoalId, GoalSnapshot, ManualClock, MonitorEngine, MonitorEvent,
    NotificationKind, NotificationStore, SettingsPatch,
};
use tempfile::TempDir;

const NOW: i64 = 1_700_000_000;
const DAY: i64 = 86_400;

fn open(dir: &TempDir, clock: Arc<ManualClock>) -> MonitorEngine {
    let db: Arc<dyn KeyValueStore> =
        Arc::new(Database::open_at(dir.path().join("goalsave.db")).unwrap());
    MonitorEngine::open(db, clock, &Config::default())
}

/// Titles oldest first; the log itself is newest first.
fn titles(engine: &MonitorEngine) -> Vec<String> {
    engine
        .store()
        .notifications()
        .iter()
        .rev()
        .map(|n| n.title.clone())
        .collect()
}

#[test]
fn test_savings_journey_across_restarts() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::at_epoch(NOW));

    {
        let mut engine = open(&dir, clock.clone());
        engine.evaluate_all(&[GoalSnapshot::new("1", "Vacation", 2000, 0)]);
        assert!(engine.store().notifications().is_empty());

        engine.evaluate_all(&[GoalSnapshot::new("1", "Vacation", 2000, 600)]);
        assert_eq!(
            titles(&engine),
            vec!["🎯 25% Milestone Reached!", "🏆 First Goal Created!"]
        );
    }

    // Same balance in a new process announces nothing new.
    let mut engine = open(&dir, clock.clone());
    engine.evaluate_all(&[GoalSnapshot::new("1", "Vacation", 2000, 600)]);
    assert_eq!(engine.store().notifications().len(), 2);

    engine.evaluate_all(&[GoalSnapshot::new("1", "Vacation", 2000, 2000)]);
    assert_eq!(
        &titles(&engine)[2..],
        &[
            "🎯 50% Milestone Reached!",
            "🎯 75% Milestone Reached!",
            "🎉 Goal Completed!",
            "🎊 Goal Master!",
        ]
    );

    let progress = engine.goal_progress(&GoalId::new("1")).unwrap();
    assert_eq!(progress.last_percentage, 100);
    assert_eq!(progress.achieved_thresholds, vec![25, 50, 75, 100]);
    assert_eq!(progress.next_threshold, None);
}

#[test]
fn test_notification_ids_are_unique_after_clear_and_restart() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::at_epoch(NOW));

    let first = {
        let mut engine = open(&dir, clock.clone());
        let id = engine.store_mut().report_error("Sync", "network unreachable");
        engine.store_mut().clear_all();
        id
    };

    let mut engine = open(&dir, clock);
    assert!(engine.store().notifications().is_empty());
    let second = engine.store_mut().report_error("Sync", "still unreachable");
    assert!(second > first);
}

#[test]
fn test_capacity_is_enforced_on_reload() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::at_epoch(NOW));

    {
        let mut engine = open(&dir, clock.clone());
        for i in 0..60 {
            engine
                .store_mut()
                .report_error("Import", format!("row {i} rejected"));
        }
        assert_eq!(engine.store().notifications().len(), 50);
        assert_eq!(engine.store().unread_count(), 50);
    }

    let engine = open(&dir, clock);
    let log = engine.store().notifications();
    assert_eq!(log.len(), 50);
    assert_eq!(log[0].message, "row 59 rejected");
    assert_eq!(log[49].message, "row 10 rejected");
}

#[test]
fn test_read_state_survives_restart() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::at_epoch(NOW));

    {
        let mut engine = open(&dir, clock.clone());
        let a = engine.store_mut().report_error("A", "first");
        engine.store_mut().report_error("B", "second");
        engine.store_mut().mark_as_read(a);
    }

    let engine = open(&dir, clock);
    assert_eq!(engine.store().notifications().len(), 2);
    assert_eq!(engine.store().unread_count(), 1);
}

#[test]
fn test_corrupt_records_fall_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("goalsave.db");
    {
        let db = Database::open_at(&path).unwrap();
        db.set("goalsave-notifications", "{not json").unwrap();
        db.set("goalsave-notification-settings", r#"{"version":99,"data":{}}"#)
            .unwrap();
        db.set("goalsave-monitor-state", "[]").unwrap();
    }

    let clock = Arc::new(ManualClock::at_epoch(NOW));
    let mut engine = open(&dir, clock);
    assert!(engine.store().notifications().is_empty());
    assert_eq!(engine.store().settings().enabled_thresholds(), vec![25, 50, 75, 100]);

    engine.evaluate_milestones(&[GoalSnapshot::new("1", "Car", 100, 30)]);
    assert_eq!(engine.store().notifications().len(), 1);
}

#[test]
fn test_overdue_alert_is_throttled_per_day() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::at_epoch(NOW));
    let goals = [GoalSnapshot::new("7", "Laptop", 1500, 100).with_deadline(NOW - 2 * DAY)];

    {
        let mut engine = open(&dir, clock.clone());
        engine.evaluate_deadlines(&goals);
        clock.advance(Duration::hours(12));
        engine.evaluate_deadlines(&goals);
        assert_eq!(engine.store().notifications().len(), 1);
    }

    // The throttle window is remembered across restarts.
    clock.advance(Duration::hours(6));
    let mut engine = open(&dir, clock.clone());
    engine.evaluate_deadlines(&goals);
    assert_eq!(engine.store().notifications().len(), 1);

    clock.advance(Duration::hours(7));
    engine.evaluate_deadlines(&goals);
    let log = engine.store().notifications();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|n| n.kind == NotificationKind::Warning));
    assert_eq!(log[0].title, "Overdue Deadline: Laptop");
}

#[test]
fn test_settings_persist_and_gate_evaluators() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::at_epoch(NOW));

    {
        let mut engine = open(&dir, clock.clone());
        let mut milestones = engine.store().settings().milestones.clone();
        for m in &mut milestones {
            m.enabled = m.percentage == 100;
        }
        engine.store_mut().update_settings(SettingsPatch {
            milestones: Some(milestones),
            ..Default::default()
        });
    }

    let mut engine = open(&dir, clock);
    assert_eq!(engine.store().settings().enabled_thresholds(), vec![100]);
    engine.evaluate_milestones(&[GoalSnapshot::new("1", "Car", 100, 80)]);
    assert!(engine.store().notifications().is_empty());
    engine.evaluate_milestones(&[GoalSnapshot::new("1", "Car", 100, 100)]);
    assert_eq!(titles(&engine), vec!["🎉 Goal Completed!"]);
}

#[test]
fn test_subscribers_see_events_before_store_entries() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::at_epoch(NOW));
    let mut engine = open(&dir, clock);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    engine.subscribe(move |event| {
        let tag = match event {
            MonitorEvent::MilestoneReached { threshold, .. } => format!("milestone {threshold}"),
            MonitorEvent::NotificationAdded { id } => format!("added {id}"),
            MonitorEvent::AchievementUnlocked { .. } => "achievement".to_string(),
            other => format!("{other:?}"),
        };
        sink.lock().unwrap().push(tag);
    });

    engine.evaluate_milestones(&[GoalSnapshot::new("1", "Car", 100, 55)]);
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["milestone 25", "added 0", "milestone 50", "added 1"]
    );
}

#[test]
fn test_store_alone_shares_records_with_engine() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::at_epoch(NOW));
    {
        let mut engine = open(&dir, clock.clone());
        engine.evaluate_all(&[GoalSnapshot::new("1", "Car", 100, 100)]);
    }

    let db: Arc<dyn KeyValueStore> =
        Arc::new(Database::open_at(dir.path().join("goalsave.db")).unwrap());
    let clock: Arc<dyn Clock> = clock;
    let store = NotificationStore::open(db, clock);
    assert_eq!(store.notifications().len(), 6);
    assert!(store
        .notifications()
        .iter()
        .filter(|n| n.kind == NotificationKind::Achievement)
        .all(|n| n.persistent));
}

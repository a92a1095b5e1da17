//! Restart resilience: snapshots bring a running session back, and days
//! spent away from the app are split at midnight boundaries.

use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use stempeluhr_core::{
    CommuteDayChecker, CommutePhaseTracker, Config, Database, FixedClock, KvStateStore,
    SettingsStore, TrackingEvent, TrackingRepository, TrackingState, TrackingStateMachine,
    TrackingType,
};

fn dt(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, d)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn machine_at(path: &Path, now: NaiveDateTime) -> (TrackingStateMachine, Arc<Database>) {
    let db = Arc::new(Database::open_at(path).unwrap());
    let settings_store = SettingsStore::new(Config::default().to_settings().unwrap());
    let machine = TrackingStateMachine::new(
        db.clone(),
        Arc::new(KvStateStore::new(db.clone())),
        Arc::new(CommutePhaseTracker::new()),
        CommuteDayChecker::new(settings_store.subscribe()),
        settings_store.subscribe(),
        Arc::new(FixedClock::new(now)),
    );
    (machine, db)
}

#[test]
fn restart_resumes_the_running_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stempeluhr.db");

    let started_id;
    {
        let (machine, _db) = machine_at(&path, dt(10, 9, 0));
        machine
            .process_event(TrackingEvent::ManualStart {
                kind: TrackingType::Manual,
            })
            .unwrap();
        started_id = match machine.state() {
            TrackingState::Tracking { entry_id, .. } => entry_id,
            other => panic!("expected a running session, got {other:?}"),
        };
    }

    // Same day, two hours later, fresh process.
    let (machine, _db) = machine_at(&path, dt(10, 11, 0));
    assert_eq!(machine.state(), TrackingState::Idle);
    machine.restore_state().unwrap();
    match machine.state() {
        TrackingState::Tracking {
            entry_id,
            kind,
            start_time,
        } => {
            assert_eq!(entry_id, started_id);
            assert_eq!(kind, TrackingType::Manual);
            assert_eq!(start_time, dt(10, 9, 0));
        }
        other => panic!("expected the session back, got {other:?}"),
    }
}

#[test]
fn days_away_split_the_session_at_the_last_midnight() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stempeluhr.db");

    let started_id;
    {
        let (machine, _db) = machine_at(&path, dt(10, 9, 0));
        machine
            .process_event(TrackingEvent::ManualStart {
                kind: TrackingType::Manual,
            })
            .unwrap();
        started_id = match machine.state() {
            TrackingState::Tracking { entry_id, .. } => entry_id,
            other => panic!("expected a running session, got {other:?}"),
        };
    }

    // The phone was off until Friday morning.
    let (machine, db) = machine_at(&path, dt(13, 8, 0));
    machine.restore_state().unwrap();

    // The stale entry ends just before Friday, and a fresh one carries on
    // from Friday midnight.
    let old = db.entry_with_pauses(&started_id).unwrap().unwrap();
    let thursday_end = NaiveDate::from_ymd_opt(2026, 2, 12)
        .unwrap()
        .and_hms_opt(23, 59, 59)
        .unwrap();
    assert_eq!(old.entry.end_time, Some(thursday_end));

    match machine.state() {
        TrackingState::Tracking {
            entry_id,
            kind,
            start_time,
        } => {
            assert_ne!(entry_id, started_id);
            assert_eq!(kind, TrackingType::Manual);
            assert_eq!(start_time, dt(13, 0, 0));
        }
        other => panic!("expected a rolled-over session, got {other:?}"),
    }
}

#[test]
fn snapshot_for_a_closed_entry_resets_to_idle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stempeluhr.db");

    {
        let (machine, db) = machine_at(&path, dt(10, 9, 0));
        machine
            .process_event(TrackingEvent::ManualStart {
                kind: TrackingType::Manual,
            })
            .unwrap();
        // Someone closed the entry behind the machine's back.
        let entry = db.active_entry().unwrap().unwrap();
        db.close_entry(&entry.id, dt(10, 16, 0)).unwrap();
    }

    let (machine, _db) = machine_at(&path, dt(10, 17, 0));
    machine.restore_state().unwrap();
    assert_eq!(machine.state(), TrackingState::Idle);
}

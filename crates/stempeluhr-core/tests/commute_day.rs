//! Integration test for a full office commute day.
//!
//! Drives the public API the way the platform layer would: geofence events
//! in, tracking entries and commute phases out.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use stempeluhr_core::{
    Clock, CommuteDayChecker, CommutePhase, CommutePhaseTracker, Config, Database, FixedClock,
    KvStateStore, SettingsStore, TrackingEvent, TrackingRepository, TrackingState,
    TrackingStateMachine, ZoneType,
};

fn dt(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, d)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn weekday_config() -> Config {
    let mut config = Config::default();
    config.commute_days = vec![
        "MONDAY".into(),
        "TUESDAY".into(),
        "WEDNESDAY".into(),
        "THURSDAY".into(),
        "FRIDAY".into(),
    ];
    config
}

struct Day {
    machine: TrackingStateMachine,
    db: Arc<Database>,
    phase: Arc<CommutePhaseTracker>,
    clock: Arc<FixedClock>,
}

fn day(now: NaiveDateTime) -> Day {
    let db = Arc::new(Database::open_memory().unwrap());
    let phase = Arc::new(CommutePhaseTracker::new());
    let clock = Arc::new(FixedClock::new(now));
    let settings_store = SettingsStore::new(weekday_config().to_settings().unwrap());
    let machine = TrackingStateMachine::new(
        db.clone(),
        Arc::new(KvStateStore::new(db.clone())),
        phase.clone(),
        CommuteDayChecker::new(settings_store.subscribe()),
        settings_store.subscribe(),
        clock.clone(),
    );
    Day {
        machine,
        db,
        phase,
        clock,
    }
}

fn enter(zone: ZoneType, timestamp: NaiveDateTime) -> TrackingEvent {
    TrackingEvent::GeofenceEntered { zone, timestamp }
}

fn exit(zone: ZoneType, timestamp: NaiveDateTime) -> TrackingEvent {
    TrackingEvent::GeofenceExited { zone, timestamp }
}

#[test]
fn full_commute_day_produces_one_entry_with_one_pause() {
    // Tuesday 2026-02-10.
    let d = day(dt(10, 7, 0));

    // Morning: home station fires inside the outbound window.
    d.machine.process_event(enter(ZoneType::HomeStation, dt(10, 7, 45))).unwrap();
    assert!(matches!(d.machine.state(), TrackingState::Tracking { .. }));
    assert_eq!(d.phase.current(), CommutePhase::Outbound);

    // Arrival at the office.
    d.machine.process_event(enter(ZoneType::Office, dt(10, 8, 32))).unwrap();
    assert_eq!(d.phase.current(), CommutePhase::InOffice);

    // Evening: leaving the office inside the return window opens a pause
    // for the walk to the station.
    d.machine.process_event(exit(ZoneType::Office, dt(10, 16, 45))).unwrap();
    assert!(matches!(d.machine.state(), TrackingState::Paused { .. }));
    assert_eq!(d.phase.current(), CommutePhase::Return);

    // Boarding at the office station closes the pause.
    d.machine.process_event(exit(ZoneType::OfficeStation, dt(10, 17, 5))).unwrap();
    assert!(matches!(d.machine.state(), TrackingState::Tracking { .. }));

    // Home again: entry closes, commute completes.
    d.machine.process_event(enter(ZoneType::HomeStation, dt(10, 17, 23))).unwrap();
    assert_eq!(d.machine.state(), TrackingState::Idle);
    assert_eq!(d.phase.current(), CommutePhase::Completed);

    let date = dt(10, 12, 0).date();
    let entries = d.db.entries_in_range(date, date).unwrap();
    assert_eq!(entries.len(), 1);
    let booked = &entries[0];
    assert_eq!(booked.entry.start_time, dt(10, 7, 45));
    assert_eq!(booked.entry.end_time, Some(dt(10, 17, 23)));
    assert!(booked.entry.auto_detected);
    assert_eq!(booked.closed_pause_minutes(), 20);
    // 9h38m gross minus the 20 minute walk.
    assert_eq!(booked.net_duration(d.clock.now()).num_minutes(), 558);
}

#[test]
fn weekend_geofence_noise_changes_nothing() {
    // Saturday 2026-02-14 is not a commute day.
    let d = day(dt(14, 7, 0));

    d.machine.process_event(enter(ZoneType::HomeStation, dt(14, 7, 45))).unwrap();
    d.machine.process_event(enter(ZoneType::Office, dt(14, 8, 32))).unwrap();

    assert_eq!(d.machine.state(), TrackingState::Idle);
    assert_eq!(d.phase.current(), CommutePhase::NotStarted);
    let date = dt(14, 12, 0).date();
    assert!(d.db.entries_in_range(date, date).unwrap().is_empty());
}

#[test]
fn missed_home_station_falls_back_to_office_arrival() {
    let d = day(dt(10, 7, 0));

    // The phone only wakes up at the office; the commute is booked from
    // there with a correction note.
    d.machine.process_event(enter(ZoneType::Office, dt(10, 8, 40))).unwrap();

    assert!(matches!(d.machine.state(), TrackingState::Tracking { .. }));
    assert_eq!(d.phase.current(), CommutePhase::InOffice);
    let entry = d.db.active_entry().unwrap().unwrap();
    assert_eq!(entry.start_time, dt(10, 8, 40));
    assert!(entry.notes.unwrap().contains("Heimbahnhof"));
}

//! Home-office auto-tracking from desk-beacon signals.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::watch;

use crate::commute::CommuteDayChecker;
use crate::error::Result;
use crate::model::TrackingType;
use crate::storage::Settings;
use crate::tracking::{TrackingEvent, TrackingState, TrackingStateMachine};

/// Decides whether a beacon sighting or timeout becomes a tracking event.
///
/// The state machine itself also guards its transitions; the checks here
/// keep beacon noise from reaching it in the first place. In particular, a
/// commute session must never be stopped or restarted just because the home
/// desk beacon drifts in or out of range.
pub struct HomeOfficeTracker {
    machine: Arc<TrackingStateMachine>,
    day_checker: CommuteDayChecker,
    settings: watch::Receiver<Settings>,
}

impl HomeOfficeTracker {
    pub fn new(
        machine: Arc<TrackingStateMachine>,
        day_checker: CommuteDayChecker,
        settings: watch::Receiver<Settings>,
    ) -> Self {
        Self {
            machine,
            day_checker,
            settings,
        }
    }

    /// Handles a beacon sighting.
    ///
    /// Ignored outside the work-time window and while any session is
    /// already running; on a commute day an active commute session stays
    /// untouched even though the user is home at their desk. Otherwise the
    /// sighting is forwarded as a session-start event.
    pub fn on_beacon_detected(&self, beacon_id: &str, timestamp: NaiveDateTime) -> Result<()> {
        if !self.settings.borrow().work_window.contains(timestamp.time()) {
            log::debug!("beacon {beacon_id} outside work window, ignored");
            return Ok(());
        }

        if let TrackingState::Tracking { kind, .. } = self.machine.state() {
            if self.day_checker.is_commute_day(timestamp) && kind == TrackingType::CommuteOffice {
                // Back home from the office, sitting at the desk.
                return Ok(());
            }
            // Any other running session blocks an auto-start as well.
            return Ok(());
        }

        self.machine.process_event(TrackingEvent::BeaconDetected {
            beacon_id: beacon_id.to_string(),
            timestamp,
        })
    }

    /// Handles a beacon timeout.
    ///
    /// Forwards a session-stop event only while a home-office session is
    /// running; `last_seen` backdates the session end to the last sighting.
    pub fn on_beacon_timeout(
        &self,
        timestamp: NaiveDateTime,
        last_seen: Option<NaiveDateTime>,
    ) -> Result<()> {
        match self.machine.state() {
            TrackingState::Tracking { kind, .. } if kind == TrackingType::HomeOffice => {
                self.machine.process_event(TrackingEvent::BeaconLost {
                    timestamp,
                    last_seen,
                })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::commute::CommutePhaseTracker;
    use crate::model::ZoneType;
    use crate::storage::{Config, Database, SettingsStore};
    use crate::tracking::MemoryStateStore;
    use chrono::NaiveDate;

    fn dt(d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn tracker() -> (HomeOfficeTracker, Arc<TrackingStateMachine>) {
        let mut config = Config::default();
        config.commute_days = vec!["TUESDAY".into()];
        let settings_store = SettingsStore::new(config.to_settings().unwrap());
        let day_checker = CommuteDayChecker::new(settings_store.subscribe());

        let machine = Arc::new(TrackingStateMachine::new(
            Arc::new(Database::open_memory().unwrap()),
            Arc::new(MemoryStateStore::new()),
            Arc::new(CommutePhaseTracker::new()),
            day_checker.clone(),
            settings_store.subscribe(),
            Arc::new(FixedClock::new(dt(10, 8, 0))),
        ));
        let tracker = HomeOfficeTracker::new(
            machine.clone(),
            day_checker,
            settings_store.subscribe(),
        );
        (tracker, machine)
    }

    #[test]
    fn beacon_starts_home_office_session() {
        let (tracker, machine) = tracker();
        tracker.on_beacon_detected("desk", dt(10, 9, 0)).unwrap();
        assert_eq!(machine.state().kind(), Some(TrackingType::HomeOffice));
    }

    #[test]
    fn beacon_ignored_outside_work_window() {
        let (tracker, machine) = tracker();
        tracker.on_beacon_detected("desk", dt(10, 5, 30)).unwrap();
        tracker.on_beacon_detected("desk", dt(10, 22, 30)).unwrap();
        assert!(machine.state().is_idle());
    }

    #[test]
    fn work_window_bounds_are_inclusive() {
        let (tracker, machine) = tracker();
        // default work window is 06:00-22:00
        tracker.on_beacon_detected("desk", dt(10, 6, 0)).unwrap();
        assert_eq!(machine.state().kind(), Some(TrackingType::HomeOffice));

        let (tracker, machine) = self::tracker();
        tracker.on_beacon_detected("desk", dt(10, 22, 0)).unwrap();
        assert_eq!(machine.state().kind(), Some(TrackingType::HomeOffice));
    }

    #[test]
    fn beacon_never_interrupts_a_commute_session() {
        let (tracker, machine) = tracker();
        // Tuesday commute under way
        machine
            .process_event(TrackingEvent::GeofenceEntered {
                zone: ZoneType::HomeStation,
                timestamp: dt(10, 7, 45),
            })
            .unwrap();
        let before = machine.state();

        tracker.on_beacon_detected("desk", dt(10, 18, 30)).unwrap();
        assert_eq!(machine.state(), before);
    }

    #[test]
    fn any_running_session_blocks_an_auto_start() {
        let (tracker, machine) = tracker();
        // Saturday, manual session
        machine
            .process_event(TrackingEvent::ManualStart {
                kind: TrackingType::Manual,
            })
            .unwrap();
        let before = machine.state();

        tracker.on_beacon_detected("desk", dt(14, 9, 0)).unwrap();
        assert_eq!(machine.state(), before);
    }

    #[test]
    fn beacon_during_a_pause_changes_nothing() {
        let (tracker, machine) = tracker();
        machine
            .process_event(TrackingEvent::ManualStart {
                kind: TrackingType::Manual,
            })
            .unwrap();
        machine.process_event(TrackingEvent::PauseStart).unwrap();
        let before = machine.state();

        // forwarded, but the machine has no use for it while paused
        tracker.on_beacon_detected("desk", dt(10, 9, 0)).unwrap();
        assert_eq!(machine.state(), before);
    }

    #[test]
    fn timeout_stops_home_office_at_last_seen() {
        let (tracker, machine) = tracker();
        tracker.on_beacon_detected("desk", dt(10, 9, 0)).unwrap();
        tracker
            .on_beacon_timeout(dt(10, 17, 10), Some(dt(10, 17, 0)))
            .unwrap();
        assert!(machine.state().is_idle());
    }

    #[test]
    fn timeout_ignored_for_other_session_kinds() {
        let (tracker, machine) = tracker();
        machine
            .process_event(TrackingEvent::ManualStart {
                kind: TrackingType::Manual,
            })
            .unwrap();

        tracker.on_beacon_timeout(dt(10, 17, 10), None).unwrap();
        assert!(matches!(machine.state(), TrackingState::Tracking { .. }));
    }

    #[test]
    fn timeout_while_idle_is_a_noop() {
        let (tracker, machine) = tracker();
        tracker.on_beacon_timeout(dt(10, 17, 10), None).unwrap();
        assert!(machine.state().is_idle());
    }
}

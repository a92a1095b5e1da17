//! The central tracking state machine.
//!
//! Converts geofence, beacon, and manual events into tracking sessions:
//! entries are opened and closed through the repository, pauses bracket the
//! walk between office and station, and the commute phase tracker is kept in
//! step. Events that make no sense in the current state are absorbed as
//! no-ops; sensor callbacks arrive duplicated and out of order, and the
//! machine is the single place that tolerates that.
//!
//! Events are processed strictly one at a time. A repository failure aborts
//! the in-flight transition: the machine keeps its prior state and the error
//! propagates to the caller.

use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDateTime, NaiveTime};
use tokio::sync::watch;

use crate::clock::Clock;
use crate::commute::{CommuteDayChecker, CommutePhase, CommutePhaseTracker};
use crate::error::{Result, StorageError};
use crate::model::{Pause, TrackingEntry, TrackingType, ZoneType};
use crate::storage::{Settings, TrackingRepository};
use crate::tracking::{StateStore, TrackingEvent, TrackingState};

/// Note attached to a commute entry started from the office-station zone
/// because the home-station zone never fired.
const NOTE_HOME_STATION_MISSED: &str =
    "Heimbahnhof-Zone nicht erkannt – bitte Startzeit prüfen und ggf. manuell korrigieren.";

/// Note attached to a commute entry started from the office zone because
/// neither station zone fired.
const NOTE_STATIONS_MISSED: &str =
    "Heimbahnhof- und Bürobahnhof-Zone nicht erkannt – bitte Startzeit prüfen und ggf. manuell korrigieren.";

/// Drives tracking sessions from events.
///
/// The current [`TrackingState`] is published through a watch channel;
/// [`state`](Self::state) reads it and [`subscribe`](Self::subscribe) hands
/// out a receiver for observers. Every accepted transition is snapshotted
/// through the [`StateStore`] so [`restore_state`](Self::restore_state) can
/// pick a running session back up after a restart.
pub struct TrackingStateMachine {
    repository: Arc<dyn TrackingRepository>,
    state_store: Arc<dyn StateStore>,
    phase: Arc<CommutePhaseTracker>,
    day_checker: CommuteDayChecker,
    settings: watch::Receiver<Settings>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<TrackingState>,
    process_lock: Mutex<()>,
}

impl TrackingStateMachine {
    pub fn new(
        repository: Arc<dyn TrackingRepository>,
        state_store: Arc<dyn StateStore>,
        phase: Arc<CommutePhaseTracker>,
        day_checker: CommuteDayChecker,
        settings: watch::Receiver<Settings>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(TrackingState::Idle);
        Self {
            repository,
            state_store,
            phase,
            day_checker,
            settings,
            clock,
            state,
            process_lock: Mutex::new(()),
        }
    }

    /// The current tracking state.
    pub fn state(&self) -> TrackingState {
        self.state.borrow().clone()
    }

    /// A receiver observing the current state and its changes.
    pub fn subscribe(&self) -> watch::Receiver<TrackingState> {
        self.state.subscribe()
    }

    /// Processes one event, possibly transitioning to a new state.
    ///
    /// Events are serialized: a second caller blocks until the first event
    /// is fully handled, including its repository writes.
    pub fn process_event(&self, event: TrackingEvent) -> Result<()> {
        let _guard = self
            .process_lock
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        self.apply_event(event)?;
        Ok(())
    }

    /// Restores the tracking state after a restart.
    ///
    /// Loads the last snapshot, validates it against the repository's open
    /// entry (a snapshot pointing at a closed or missing entry resets to
    /// Idle), then rolls any session still open from a previous day over the
    /// midnight boundary.
    pub fn restore_state(&self) -> Result<()> {
        let _guard = self
            .process_lock
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        let snapshot = self.state_store.load()?;
        let restored = match &snapshot {
            TrackingState::Idle => TrackingState::Idle,
            TrackingState::Tracking { entry_id, .. }
            | TrackingState::Paused { entry_id, .. } => {
                match self.repository.active_entry()? {
                    Some(entry) if entry.id == *entry_id => snapshot.clone(),
                    _ => {
                        log::warn!("tracking snapshot refers to no open entry, resetting to idle");
                        TrackingState::Idle
                    }
                }
            }
        };

        self.state.send_replace(restored.clone());
        if restored != snapshot {
            self.save_snapshot(&restored);
        }

        // A session left open before today is split at the day boundary.
        let today = self.clock.today();
        loop {
            let entry_date = match self.state() {
                TrackingState::Idle => break,
                TrackingState::Tracking { start_time, .. } => start_time.date(),
                TrackingState::Paused { .. } => match self.repository.active_entry()? {
                    Some(entry) => entry.start_time.date(),
                    None => break,
                },
            };
            if entry_date >= today {
                break;
            }
            self.apply_event(TrackingEvent::MidnightRollover)?;
        }
        Ok(())
    }

    // Caller holds the process lock.
    fn apply_event(&self, event: TrackingEvent) -> Result<(), StorageError> {
        let current = self.state();
        let next = match &current {
            TrackingState::Idle => self.handle_idle(&event)?,
            TrackingState::Tracking { entry_id, kind, .. } => {
                self.handle_tracking(entry_id, *kind, &event)?
            }
            TrackingState::Paused {
                entry_id,
                kind,
                pause_id,
            } => self.handle_paused(entry_id, *kind, pause_id, &event)?,
        };

        if let Some(next) = next {
            if next != current {
                log::debug!("tracking state {current:?} -> {next:?}");
                self.state.send_replace(next.clone());
                self.save_snapshot(&next);
            }
        }
        Ok(())
    }

    fn handle_idle(&self, event: &TrackingEvent) -> Result<Option<TrackingState>, StorageError> {
        match event {
            TrackingEvent::GeofenceEntered { zone, timestamp } => {
                self.handle_geofence_entered_while_idle(*zone, *timestamp)
            }
            TrackingEvent::BeaconDetected { timestamp, .. } => {
                if !self.settings.borrow().work_window.contains(timestamp.time()) {
                    return Ok(None);
                }
                self.start_entry(TrackingType::HomeOffice, *timestamp, true, None)
                    .map(Some)
            }
            TrackingEvent::ManualStart { kind } => self
                .start_entry(*kind, self.clock.now(), false, None)
                .map(Some),
            _ => Ok(None),
        }
    }

    fn handle_geofence_entered_while_idle(
        &self,
        zone: ZoneType,
        timestamp: NaiveDateTime,
    ) -> Result<Option<TrackingState>, StorageError> {
        if !self.day_checker.is_commute_day(timestamp) {
            return Ok(None);
        }
        match zone {
            ZoneType::HomeStation => {
                if !self.day_checker.is_in_outbound_window(timestamp) {
                    return Ok(None);
                }
                let state =
                    self.start_entry(TrackingType::CommuteOffice, timestamp, true, None)?;
                self.phase.start_commute();
                Ok(Some(state))
            }
            // Fallback: the home-station zone never fired but the user is
            // clearly commuting. Start late and flag the entry for review.
            ZoneType::OfficeStation => {
                if !self.day_checker.is_in_outbound_window(timestamp) {
                    return Ok(None);
                }
                let state = self.start_entry(
                    TrackingType::CommuteOffice,
                    timestamp,
                    true,
                    Some(NOTE_HOME_STATION_MISSED),
                )?;
                self.phase.start_commute();
                Ok(Some(state))
            }
            // Fallback: neither station zone fired; the office itself is the
            // first signal of the day. No window check, arrival time varies.
            ZoneType::Office => {
                let state = self.start_entry(
                    TrackingType::CommuteOffice,
                    timestamp,
                    true,
                    Some(NOTE_STATIONS_MISSED),
                )?;
                self.phase.start_commute();
                self.phase.enter_office();
                Ok(Some(state))
            }
        }
    }

    fn handle_tracking(
        &self,
        entry_id: &str,
        kind: TrackingType,
        event: &TrackingEvent,
    ) -> Result<Option<TrackingState>, StorageError> {
        match event {
            TrackingEvent::GeofenceEntered { zone, timestamp } => match zone {
                ZoneType::Office => {
                    if kind == TrackingType::CommuteOffice {
                        self.phase.enter_office();
                    }
                    Ok(None)
                }
                // Waiting for the train on the way out counts as a pause.
                ZoneType::OfficeStation => {
                    if kind != TrackingType::CommuteOffice
                        || self.phase.current() != CommutePhase::Outbound
                    {
                        return Ok(None);
                    }
                    self.start_pause(entry_id, kind, *timestamp).map(Some)
                }
                ZoneType::HomeStation => {
                    self.stop_at_home_station(entry_id, kind, None, *timestamp)
                }
            },
            TrackingEvent::GeofenceExited { zone, timestamp } => {
                if *zone != ZoneType::Office || kind != TrackingType::CommuteOffice {
                    return Ok(None);
                }
                self.phase.exit_office();
                if self.day_checker.is_in_return_window(*timestamp) {
                    // Evening: pause for the walk from office to station.
                    self.start_pause(entry_id, kind, *timestamp).map(Some)
                } else {
                    // Lunch or another short exit: phase moved, no pause.
                    Ok(None)
                }
            }
            TrackingEvent::BeaconLost {
                timestamp,
                last_seen,
            } => {
                if kind != TrackingType::HomeOffice {
                    return Ok(None);
                }
                // The session ended when the beacon was last seen, not when
                // the timeout expired.
                let end = last_seen.unwrap_or(*timestamp);
                self.repository.close_entry(entry_id, end)?;
                self.phase.reset();
                Ok(Some(TrackingState::Idle))
            }
            TrackingEvent::ManualStop => {
                self.repository.close_entry(entry_id, self.clock.now())?;
                self.phase.reset();
                Ok(Some(TrackingState::Idle))
            }
            TrackingEvent::PauseStart => {
                self.start_pause(entry_id, kind, self.clock.now()).map(Some)
            }
            TrackingEvent::MidnightRollover => self.rollover_tracking(entry_id, kind).map(Some),
            _ => Ok(None),
        }
    }

    fn handle_paused(
        &self,
        entry_id: &str,
        kind: TrackingType,
        pause_id: &str,
        event: &TrackingEvent,
    ) -> Result<Option<TrackingState>, StorageError> {
        match event {
            TrackingEvent::GeofenceEntered { zone, timestamp } => match zone {
                // Morning: arriving at the office ends the station pause.
                ZoneType::Office => {
                    if kind != TrackingType::CommuteOffice
                        || self.phase.current() != CommutePhase::Outbound
                    {
                        return Ok(None);
                    }
                    self.phase.enter_office();
                    self.resume(entry_id, kind, pause_id, *timestamp).map(Some)
                }
                ZoneType::HomeStation => {
                    self.stop_at_home_station(entry_id, kind, Some(pause_id), *timestamp)
                }
                ZoneType::OfficeStation => Ok(None),
            },
            // Evening: leaving the office station means boarding the train;
            // the pause ends and work continues until the home station.
            TrackingEvent::GeofenceExited { zone, timestamp } => {
                if *zone != ZoneType::OfficeStation
                    || kind != TrackingType::CommuteOffice
                    || self.phase.current() != CommutePhase::Return
                {
                    return Ok(None);
                }
                self.resume(entry_id, kind, pause_id, *timestamp).map(Some)
            }
            TrackingEvent::PauseResume => self
                .resume(entry_id, kind, pause_id, self.clock.now())
                .map(Some),
            TrackingEvent::ManualStop => {
                let now = self.clock.now();
                self.repository.close_pause(pause_id, now)?;
                self.repository.close_entry(entry_id, now)?;
                self.phase.reset();
                Ok(Some(TrackingState::Idle))
            }
            TrackingEvent::MidnightRollover => {
                self.rollover_paused(entry_id, kind, pause_id).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Ends the commute when the home-station zone fires on the way back.
    ///
    /// Requires a commute session inside the return window, with the phase
    /// at Return or still at Outbound (the office zone may never have
    /// fired). An open station pause is closed at the same instant.
    fn stop_at_home_station(
        &self,
        entry_id: &str,
        kind: TrackingType,
        pause_id: Option<&str>,
        timestamp: NaiveDateTime,
    ) -> Result<Option<TrackingState>, StorageError> {
        if kind != TrackingType::CommuteOffice {
            return Ok(None);
        }
        if !self.day_checker.is_in_return_window(timestamp) {
            return Ok(None);
        }
        let phase = self.phase.current();
        if phase != CommutePhase::Return && phase != CommutePhase::Outbound {
            return Ok(None);
        }

        if let Some(pause_id) = pause_id {
            self.repository.close_pause(pause_id, timestamp)?;
        }
        self.repository.close_entry(entry_id, timestamp)?;

        // Completed is left visible for observers; the next start_commute
        // or a reset clears it.
        self.phase.complete_commute();
        Ok(Some(TrackingState::Idle))
    }

    fn start_entry(
        &self,
        kind: TrackingType,
        at: NaiveDateTime,
        auto_detected: bool,
        notes: Option<&str>,
    ) -> Result<TrackingState, StorageError> {
        let mut entry = TrackingEntry::open(kind, at, auto_detected);
        if let Some(notes) = notes {
            entry = entry.with_notes(notes);
        }
        self.repository.create_entry(&entry)?;
        Ok(TrackingState::Tracking {
            entry_id: entry.id,
            kind,
            start_time: at,
        })
    }

    fn start_pause(
        &self,
        entry_id: &str,
        kind: TrackingType,
        at: NaiveDateTime,
    ) -> Result<TrackingState, StorageError> {
        let pause = Pause::open(entry_id, at);
        self.repository.create_pause(&pause)?;
        Ok(TrackingState::Paused {
            entry_id: entry_id.to_string(),
            kind,
            pause_id: pause.id,
        })
    }

    fn resume(
        &self,
        entry_id: &str,
        kind: TrackingType,
        pause_id: &str,
        at: NaiveDateTime,
    ) -> Result<TrackingState, StorageError> {
        self.repository.close_pause(pause_id, at)?;
        match self.repository.active_entry()? {
            Some(entry) => Ok(TrackingState::Tracking {
                entry_id: entry_id.to_string(),
                kind,
                start_time: entry.start_time,
            }),
            None => Ok(TrackingState::Idle),
        }
    }

    fn rollover_tracking(
        &self,
        entry_id: &str,
        kind: TrackingType,
    ) -> Result<TrackingState, StorageError> {
        let (end_of_yesterday, start_of_today) = self.day_boundary();
        self.repository.close_entry(entry_id, end_of_yesterday)?;
        self.start_entry(kind, start_of_today, true, None)
    }

    fn rollover_paused(
        &self,
        entry_id: &str,
        kind: TrackingType,
        pause_id: &str,
    ) -> Result<TrackingState, StorageError> {
        let (end_of_yesterday, start_of_today) = self.day_boundary();
        self.repository.close_pause(pause_id, end_of_yesterday)?;
        self.repository.close_entry(entry_id, end_of_yesterday)?;

        let entry = TrackingEntry::open(kind, start_of_today, true);
        self.repository.create_entry(&entry)?;
        let pause = Pause::open(entry.id.as_str(), start_of_today);
        self.repository.create_pause(&pause)?;
        Ok(TrackingState::Paused {
            entry_id: entry.id,
            kind,
            pause_id: pause.id,
        })
    }

    /// 23:59:59 yesterday and 00:00 today, anchored to the clock's today.
    fn day_boundary(&self) -> (NaiveDateTime, NaiveDateTime) {
        let start_of_today = self.clock.today().and_time(NaiveTime::MIN);
        (start_of_today - Duration::seconds(1), start_of_today)
    }

    fn save_snapshot(&self, state: &TrackingState) {
        // The transition is already persisted in the repository; a failed
        // snapshot only degrades restart recovery.
        if let Err(err) = self.state_store.save(state) {
            log::warn!("failed to persist tracking state snapshot: {err}");
        }
    }
}

//! Command implementations.
//!
//! Each invocation is its own short-lived process, so [`App::open`] rebuilds
//! what the app keeps alive in memory: it wires the state machine to the
//! database, restores the last tracking snapshot (applying any pending
//! midnight rollovers) and picks the commute phase back up from the kv
//! store. Commands that changed anything write the phase back before they
//! return.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use stempeluhr_core::{
    Clock, CommuteDayChecker, CommutePhase, CommutePhaseTracker, Config, Database, KvStateStore,
    SettingsStore, SystemClock, TrackingState, TrackingStateMachine, TrackingType,
};

pub mod config;
pub mod entries;
pub mod export;
pub mod remind;
pub mod signal;
pub mod stats;
pub mod track;

const PHASE_KEY: &str = "commute_phase";

pub(crate) struct App {
    pub db: Arc<Database>,
    pub settings: SettingsStore,
    pub phase: Arc<CommutePhaseTracker>,
    pub machine: Arc<TrackingStateMachine>,
    clock: Arc<SystemClock>,
}

impl App {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let settings = SettingsStore::from_config(&config)?;
        let db = Arc::new(Database::open()?);
        let phase = Arc::new(CommutePhaseTracker::with_phase(load_phase(&db)));
        let clock = Arc::new(SystemClock);

        let machine = Arc::new(TrackingStateMachine::new(
            db.clone(),
            Arc::new(KvStateStore::new(db.clone())),
            phase.clone(),
            CommuteDayChecker::new(settings.subscribe()),
            settings.subscribe(),
            clock.clone(),
        ));
        machine.restore_state()?;

        // A mid-commute phase without an open session can only be left over
        // from a snapshot that did not survive restore; drop it.
        if machine.state().is_idle()
            && !matches!(
                phase.current(),
                CommutePhase::NotStarted | CommutePhase::Completed
            )
        {
            phase.reset();
        }

        Ok(Self {
            db,
            settings,
            phase,
            machine,
            clock,
        })
    }

    /// Writes the commute phase back for the next invocation, the same way
    /// the machine snapshots its own state.
    pub fn save_phase(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.db.kv_set(PHASE_KEY, self.phase.current().as_str())?;
        Ok(())
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }
}

fn load_phase(db: &Database) -> CommutePhase {
    match db.kv_get(PHASE_KEY) {
        Ok(Some(stored)) => stored.parse().unwrap_or(CommutePhase::NotStarted),
        _ => CommutePhase::NotStarted,
    }
}

/// One line summarizing the session state, with the commute phase appended
/// while one is in flight.
pub(crate) fn status_line(state: &TrackingState, phase: CommutePhase) -> String {
    let line = match state {
        TrackingState::Idle => "idle".to_string(),
        TrackingState::Tracking {
            kind, start_time, ..
        } => format!(
            "tracking {} since {}",
            kind.as_str(),
            start_time.format("%Y-%m-%d %H:%M")
        ),
        TrackingState::Paused { kind, .. } => format!("paused {}", kind.as_str()),
    };
    if phase == CommutePhase::NotStarted {
        line
    } else {
        format!("{line} (commute phase {})", phase.as_str())
    }
}

/// Parses `YYYY-MM-DD`.
pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM-DD, got {value:?}"))
}

/// Parses `HH:MM`.
pub(crate) fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| format!("expected HH:MM, got {value:?}"))
}

/// Parses an event timestamp: bare `HH:MM` means that time today, a full
/// `YYYY-MM-DDTHH:MM[:SS]` is taken as given, `None` means now.
pub(crate) fn parse_at(value: Option<&str>, now: NaiveDateTime) -> Result<NaiveDateTime, String> {
    let Some(value) = value else {
        return Ok(now);
    };
    if let Ok(time) = NaiveTime::parse_from_str(value, "%H:%M") {
        return Ok(now.date().and_time(time));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|_| format!("expected HH:MM or YYYY-MM-DDTHH:MM, got {value:?}"))
}

/// Parses a session kind argument.
pub(crate) fn parse_kind(value: &str) -> Result<TrackingType, String> {
    match value {
        "office" => Ok(TrackingType::CommuteOffice),
        "home" => Ok(TrackingType::HomeOffice),
        "manual" => Ok(TrackingType::Manual),
        other => Err(format!(
            "unknown kind {other:?} (expected office, home, or manual)"
        )),
    }
}

//! Events fed into the tracking state machine.

use chrono::NaiveDateTime;

use crate::model::{TrackingType, ZoneType};

/// An input to [`TrackingStateMachine::process_event`].
///
/// Sensor-driven events carry the timestamp at which the underlying signal
/// fired; entries and pauses are booked at that instant, not at processing
/// time. Manual events carry no timestamp and are stamped with the machine's
/// clock when processed.
///
/// [`TrackingStateMachine::process_event`]: crate::tracking::TrackingStateMachine::process_event
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEvent {
    /// A geofence was entered.
    GeofenceEntered {
        zone: ZoneType,
        timestamp: NaiveDateTime,
    },
    /// A geofence was exited.
    GeofenceExited {
        zone: ZoneType,
        timestamp: NaiveDateTime,
    },
    /// The workplace beacon came into range.
    BeaconDetected {
        beacon_id: String,
        timestamp: NaiveDateTime,
    },
    /// The workplace beacon has been out of range long enough to count as
    /// gone. `last_seen` is the last sighting before the timeout, used to
    /// backdate the session end.
    BeaconLost {
        timestamp: NaiveDateTime,
        last_seen: Option<NaiveDateTime>,
    },
    /// The user started tracking by hand.
    ManualStart { kind: TrackingType },
    /// The user stopped tracking by hand.
    ManualStop,
    /// The user started a pause by hand.
    PauseStart,
    /// The user ended a pause by hand.
    PauseResume,
    /// A session is still open past midnight; split it at the day boundary.
    MidnightRollover,
    /// The process came back up; state has just been restored.
    AppRestarted,
}

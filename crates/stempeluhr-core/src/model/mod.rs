//! Domain value types shared across the detection core.

mod beacon;
mod entry;
mod time_window;

pub use beacon::{BeaconConfig, DEFAULT_SCAN_INTERVAL_MS, DEFAULT_TIMEOUT_MINUTES};
pub use entry::{EntryWithPauses, ParseTrackingTypeError, Pause, TrackingEntry, TrackingType};
pub use time_window::TimeWindow;

pub(crate) use time_window::hm;

/// Classification of a geofence zone.
///
/// Zones are registered with the device OS by an outer layer; the core only
/// consumes enter/exit events tagged with the zone kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneType {
    /// Station near home, start and end of a commute.
    HomeStation,
    /// The office itself.
    Office,
    /// Station near the office.
    OfficeStation,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::HomeStation => "HOME_STATION",
            ZoneType::Office => "OFFICE",
            ZoneType::OfficeStation => "OFFICE_STATION",
        }
    }
}

//! Tracking entries and pauses.
//!
//! An entry is one work session; at most one entry is open (no end time) at
//! any moment. Pauses belong to an entry and follow the same rule: at most
//! one open pause per entry.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Classifies how a tracking session originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingType {
    /// Auto-detected commute to the office.
    CommuteOffice,
    /// Auto-detected home-office session (desk beacon).
    HomeOffice,
    /// Manually started session.
    Manual,
}

impl TrackingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingType::CommuteOffice => "COMMUTE_OFFICE",
            TrackingType::HomeOffice => "HOME_OFFICE",
            TrackingType::Manual => "MANUAL",
        }
    }
}

impl fmt::Display for TrackingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown tracking type `{0}`")]
pub struct ParseTrackingTypeError(String);

impl FromStr for TrackingType {
    type Err = ParseTrackingTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMMUTE_OFFICE" => Ok(TrackingType::CommuteOffice),
            "HOME_OFFICE" => Ok(TrackingType::HomeOffice),
            "MANUAL" => Ok(TrackingType::Manual),
            other => Err(ParseTrackingTypeError(other.to_string())),
        }
    }
}

/// One work session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingEntry {
    pub id: String,
    pub date: NaiveDate,
    pub kind: TrackingType,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub auto_detected: bool,
    pub confirmed: bool,
    pub notes: Option<String>,
}

impl TrackingEntry {
    /// Opens a new running entry starting at `start_time`.
    pub fn open(kind: TrackingType, start_time: NaiveDateTime, auto_detected: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date: start_time.date(),
            kind,
            start_time,
            end_time: None,
            auto_detected,
            confirmed: false,
            notes: None,
        }
    }

    /// Creates an already-completed entry, e.g. manual bookkeeping after the
    /// fact.
    pub fn completed(
        kind: TrackingType,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date: start_time.date(),
            kind,
            start_time,
            end_time: Some(end_time),
            auto_detected: false,
            confirmed: false,
            notes,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// A pause within a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pause {
    pub id: String,
    pub entry_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
}

impl Pause {
    /// Opens a new active pause on `entry_id` starting at `start_time`.
    pub fn open(entry_id: impl Into<String>, start_time: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entry_id: entry_id.into(),
            start_time,
            end_time: None,
        }
    }

    /// Creates an already-closed pause.
    pub fn closed(
        entry_id: impl Into<String>,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entry_id: entry_id.into(),
            start_time,
            end_time: Some(end_time),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// An entry together with its pauses, as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryWithPauses {
    pub entry: TrackingEntry,
    pub pauses: Vec<Pause>,
}

impl EntryWithPauses {
    /// Sum of closed-pause durations in whole minutes. Open pauses
    /// contribute zero.
    pub fn closed_pause_minutes(&self) -> i64 {
        self.pauses
            .iter()
            .filter_map(|p| p.end_time.map(|end| (end - p.start_time).num_minutes()))
            .sum()
    }

    /// Net duration: gross minus closed pauses. Open entries are measured up
    /// to `now`; pause arithmetic is minute-granular.
    pub fn net_duration(&self, now: NaiveDateTime) -> Duration {
        let end = self.entry.end_time.unwrap_or(now);
        let gross = end - self.entry.start_time;
        gross - Duration::minutes(self.closed_pause_minutes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn closed_entry(start: NaiveDateTime, end: NaiveDateTime) -> TrackingEntry {
        TrackingEntry::completed(TrackingType::Manual, start, end, None)
    }

    #[test]
    fn net_duration_without_pauses_is_gross() {
        let with_pauses = EntryWithPauses {
            entry: closed_entry(dt(8, 0), dt(17, 0)),
            pauses: vec![],
        };
        assert_eq!(with_pauses.net_duration(dt(23, 0)).num_minutes(), 540);
    }

    #[test]
    fn net_duration_subtracts_closed_pauses() {
        let entry = closed_entry(dt(8, 0), dt(17, 0));
        let with_pauses = EntryWithPauses {
            pauses: vec![
                Pause::closed(&entry.id, dt(12, 0), dt(12, 30)),
                Pause::closed(&entry.id, dt(15, 0), dt(15, 15)),
            ],
            entry,
        };
        assert_eq!(with_pauses.net_duration(dt(23, 0)).num_minutes(), 495);
    }

    #[test]
    fn open_pause_contributes_zero() {
        let entry = closed_entry(dt(8, 0), dt(17, 0));
        let with_pauses = EntryWithPauses {
            pauses: vec![
                Pause::closed(&entry.id, dt(12, 0), dt(12, 30)),
                Pause::open(&entry.id, dt(16, 0)),
            ],
            entry,
        };
        assert_eq!(with_pauses.net_duration(dt(23, 0)).num_minutes(), 510);
    }

    #[test]
    fn open_entry_measures_to_now() {
        let with_pauses = EntryWithPauses {
            entry: TrackingEntry::open(TrackingType::HomeOffice, dt(8, 0), true),
            pauses: vec![],
        };
        assert_eq!(with_pauses.net_duration(dt(9, 30)).num_minutes(), 90);
    }

    #[test]
    fn tracking_type_round_trips_through_str() {
        for kind in [
            TrackingType::CommuteOffice,
            TrackingType::HomeOffice,
            TrackingType::Manual,
        ] {
            assert_eq!(kind.as_str().parse::<TrackingType>().unwrap(), kind);
        }
        assert!("WEEKEND".parse::<TrackingType>().is_err());
    }

    #[test]
    fn open_entry_takes_date_from_start_time() {
        let entry = TrackingEntry::open(TrackingType::CommuteOffice, dt(7, 45), true);
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2026, 2, 10).unwrap());
        assert!(entry.is_open());
        assert!(!entry.confirmed);
    }
}

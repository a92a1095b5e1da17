//! Day and week aggregates over tracking entries.
//!
//! All figures are whole minutes; fractional display is left to the caller.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::model::{EntryWithPauses, TrackingType};

/// Work-time figures for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DayStats {
    /// Work time including pauses.
    pub gross_minutes: i64,
    /// Closed-pause time.
    pub pause_minutes: i64,
    /// Gross minus pauses.
    pub net_minutes: i64,
    /// Daily target (weekly target over five work days).
    pub target_minutes: i64,
    /// Minutes left to the target, floored at zero.
    pub remaining_minutes: i64,
}

impl DayStats {
    /// Aggregates a day's entries. Open entries are measured up to `now`.
    pub fn compute(
        entries: &[EntryWithPauses],
        daily_target_hours: f64,
        now: NaiveDateTime,
    ) -> Self {
        let gross_minutes: i64 = entries
            .iter()
            .map(|e| {
                let end = e.entry.end_time.unwrap_or(now);
                (end - e.entry.start_time).num_minutes()
            })
            .sum();
        let pause_minutes: i64 = entries.iter().map(|e| e.closed_pause_minutes()).sum();
        let net_minutes = gross_minutes - pause_minutes;
        let target_minutes = (daily_target_hours * 60.0) as i64;

        Self {
            gross_minutes,
            pause_minutes,
            net_minutes,
            target_minutes,
            remaining_minutes: (target_minutes - net_minutes).max(0),
        }
    }
}

/// One day condensed to a line: what kind of work, how much, reviewed or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    /// Kind of the day's first entry; `None` for a day without work.
    pub kind: Option<TrackingType>,
    pub net_minutes: i64,
    /// Whether every entry of the day has been confirmed.
    pub confirmed: bool,
}

impl DaySummary {
    pub fn from_entries(date: NaiveDate, entries: &[EntryWithPauses], now: NaiveDateTime) -> Self {
        if entries.is_empty() {
            return Self {
                date,
                kind: None,
                net_minutes: 0,
                confirmed: true,
            };
        }
        Self {
            date,
            kind: Some(entries[0].entry.kind),
            net_minutes: entries
                .iter()
                .map(|e| e.net_duration(now).num_minutes())
                .sum(),
            confirmed: entries.iter().all(|e| e.entry.confirmed),
        }
    }
}

/// Work-time figures for one week.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct WeekStats {
    pub total_minutes: i64,
    pub target_minutes: i64,
    /// Net work as a share of the target, in percent.
    pub percentage: f64,
    /// Positive when over target, negative when under.
    pub overtime_minutes: i64,
    /// Average over days that have any net work.
    pub average_per_day_minutes: i64,
}

impl WeekStats {
    pub fn compute(summaries: &[DaySummary], weekly_target_hours: f64) -> Self {
        let total_minutes: i64 = summaries.iter().map(|s| s.net_minutes).sum();
        let target_minutes = (weekly_target_hours * 60.0) as i64;
        let percentage = if target_minutes > 0 {
            total_minutes as f64 / target_minutes as f64 * 100.0
        } else {
            0.0
        };
        let worked_days = summaries.iter().filter(|s| s.net_minutes > 0).count() as i64;
        let average_per_day_minutes = if worked_days > 0 {
            total_minutes / worked_days
        } else {
            0
        };

        Self {
            total_minutes,
            target_minutes,
            percentage,
            overtime_minutes: total_minutes - target_minutes,
            average_per_day_minutes,
        }
    }
}

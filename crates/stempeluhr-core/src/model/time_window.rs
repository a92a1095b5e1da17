//! Time-of-day windows for commute and work-time checks.

use chrono::NaiveTime;

/// An inclusive time-of-day window.
///
/// `start <= end` always holds; overnight wraparound is not supported. Equal
/// bounds form a one-instant window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    /// Creates a window. Returns `None` when `start > end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// True when `time` lies inside the window, bounds inclusive.
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }

    /// Formats the window as `HH:MM–HH:MM`.
    pub fn format(&self) -> String {
        format!("{}–{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }

    /// Default work-time window, 06:00–22:00.
    pub fn default_work_time() -> Self {
        Self {
            start: hm(6, 0),
            end: hm(22, 0),
        }
    }

    /// Default outbound commute window, 06:00–09:30.
    pub fn default_outbound() -> Self {
        Self {
            start: hm(6, 0),
            end: hm(9, 30),
        }
    }

    /// Default return commute window, 16:00–20:00.
    pub fn default_return() -> Self {
        Self {
            start: hm(16, 0),
            end: hm(20, 0),
        }
    }
}

pub(crate) fn hm(hours: u32, minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hours, minutes, 0).unwrap_or(NaiveTime::MIN)
}

//! Clock abstraction.
//!
//! "Now" is injected everywhere the core needs it so that tests can supply
//! fixed timestamps; window-boundary behavior is only testable with a
//! deterministic clock. Sensor events carry their own timestamps and bypass
//! the clock entirely.

use std::sync::Mutex;

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of the current wall-clock time, in naive local time.
pub trait Clock: Send + Sync {
    /// The current date and time.
    fn now(&self) -> NaiveDateTime;

    /// The current date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// System clock in local time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A settable clock for tests and simulations.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to a new instant.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
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

    #[test]
    fn fixed_clock_returns_and_updates_instant() {
        let clock = FixedClock::new(dt(8, 0));
        assert_eq!(clock.now(), dt(8, 0));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 2, 10).unwrap());

        clock.set(dt(17, 30));
        assert_eq!(clock.now(), dt(17, 30));
    }

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}

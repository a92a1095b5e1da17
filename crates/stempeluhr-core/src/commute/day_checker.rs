//! Commute-day and time-window checks against the current settings.

use chrono::{Datelike, NaiveDateTime};
use tokio::sync::watch;

use crate::storage::Settings;

/// Answers "is this a commute day?" and "are we inside the outbound or
/// return window?" from the current settings.
///
/// Holds a settings receiver, so checks always see the latest configuration
/// without the callers having to thread it through.
#[derive(Clone)]
pub struct CommuteDayChecker {
    settings: watch::Receiver<Settings>,
}

impl CommuteDayChecker {
    pub fn new(settings: watch::Receiver<Settings>) -> Self {
        Self { settings }
    }

    /// Whether the given moment falls on a configured commute weekday.
    pub fn is_commute_day(&self, now: NaiveDateTime) -> bool {
        self.settings.borrow().commute_days.contains(&now.weekday())
    }

    /// Whether the given moment lies inside the outbound window (inclusive
    /// at both ends).
    pub fn is_in_outbound_window(&self, now: NaiveDateTime) -> bool {
        self.settings.borrow().outbound_window.contains(now.time())
    }

    /// Whether the given moment lies inside the return window (inclusive at
    /// both ends).
    pub fn is_in_return_window(&self, now: NaiveDateTime) -> bool {
        self.settings.borrow().return_window.contains(now.time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SettingsStore;
    use chrono::{NaiveDate, Weekday};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn checker_with_days(days: &[Weekday]) -> (SettingsStore, CommuteDayChecker) {
        let mut settings = Settings::default();
        settings.commute_days = days.iter().copied().collect();
        let store = SettingsStore::new(settings);
        let checker = CommuteDayChecker::new(store.subscribe());
        (store, checker)
    }

    #[test]
    fn commute_day_matches_configured_weekdays() {
        // 2026-02-10 is a Tuesday
        let (_store, checker) = checker_with_days(&[Weekday::Tue, Weekday::Thu]);
        assert!(checker.is_commute_day(at(2026, 2, 10, 8, 0)));
        assert!(checker.is_commute_day(at(2026, 2, 12, 8, 0)));
        assert!(!checker.is_commute_day(at(2026, 2, 11, 8, 0)));
    }

    #[test]
    fn no_commute_days_means_never() {
        let (_store, checker) = checker_with_days(&[]);
        assert!(!checker.is_commute_day(at(2026, 2, 10, 8, 0)));
    }

    #[test]
    fn outbound_window_bounds_are_inclusive() {
        let (_store, checker) = checker_with_days(&[Weekday::Tue]);
        // default outbound window is 06:00-09:30
        assert!(checker.is_in_outbound_window(at(2026, 2, 10, 6, 0)));
        assert!(checker.is_in_outbound_window(at(2026, 2, 10, 9, 30)));
        assert!(!checker.is_in_outbound_window(at(2026, 2, 10, 5, 59)));
        assert!(!checker.is_in_outbound_window(at(2026, 2, 10, 9, 31)));
    }

    #[test]
    fn return_window_bounds_are_inclusive() {
        let (_store, checker) = checker_with_days(&[Weekday::Tue]);
        // default return window is 16:00-20:00
        assert!(checker.is_in_return_window(at(2026, 2, 10, 16, 0)));
        assert!(checker.is_in_return_window(at(2026, 2, 10, 20, 0)));
        assert!(!checker.is_in_return_window(at(2026, 2, 10, 15, 59)));
    }

    #[test]
    fn checks_follow_settings_updates() {
        let (store, checker) = checker_with_days(&[Weekday::Tue]);
        assert!(checker.is_commute_day(at(2026, 2, 10, 8, 0)));

        store.update(|settings| {
            settings.commute_days = [Weekday::Mon].into_iter().collect();
        });
        assert!(!checker.is_commute_day(at(2026, 2, 10, 8, 0)));
        assert!(checker.is_commute_day(at(2026, 2, 9, 8, 0)));
    }
}

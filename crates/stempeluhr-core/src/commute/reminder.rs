//! Reminder decisions for commute days.
//!
//! Two stateless predicates; the caller supplies the clock reading and the
//! "has tracking today" flag (an entry for today exists, active or closed)
//! and decides what to do with the answer.

use chrono::NaiveTime;

use crate::model::hm;

/// Default time of day after which a missing tracking session is flagged.
pub fn default_reminder_time() -> NaiveTime {
    hm(10, 0)
}

/// Default time of day after which a still-running session is flagged.
pub fn default_cutoff_time() -> NaiveTime {
    hm(21, 0)
}

/// Whether to remind that no tracking has been recorded yet today.
///
/// True on a commute day once `reminder_time` has been reached and no entry
/// for today exists.
pub fn should_show_no_tracking_reminder(
    current_time: NaiveTime,
    reminder_time: NaiveTime,
    is_commute_day: bool,
    has_tracking_today: bool,
) -> bool {
    is_commute_day && current_time >= reminder_time && !has_tracking_today
}

/// Whether to remind that tracking is still running late in the evening.
///
/// True once `cutoff_time` has been reached while today has tracking. The
/// caller passes `has_tracking_today = true` only while a session is still
/// open, so a session closed before the cutoff never triggers this.
pub fn should_show_late_tracking_reminder(
    current_time: NaiveTime,
    cutoff_time: NaiveTime,
    has_tracking_today: bool,
) -> bool {
    has_tracking_today && current_time >= cutoff_time
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_tracking_reminder_fires_at_reminder_time() {
        let reminder = default_reminder_time();
        assert!(should_show_no_tracking_reminder(hm(10, 0), reminder, true, false));
        assert!(should_show_no_tracking_reminder(hm(14, 30), reminder, true, false));
    }

    #[test]
    fn no_tracking_reminder_waits_until_reminder_time() {
        let reminder = default_reminder_time();
        assert!(!should_show_no_tracking_reminder(hm(9, 59), reminder, true, false));
    }

    #[test]
    fn no_tracking_reminder_skips_non_commute_days() {
        let reminder = default_reminder_time();
        assert!(!should_show_no_tracking_reminder(hm(11, 0), reminder, false, false));
    }

    #[test]
    fn no_tracking_reminder_skips_days_with_tracking() {
        let reminder = default_reminder_time();
        assert!(!should_show_no_tracking_reminder(hm(11, 0), reminder, true, true));
    }

    #[test]
    fn late_reminder_fires_at_cutoff_while_tracking() {
        let cutoff = default_cutoff_time();
        assert!(should_show_late_tracking_reminder(hm(21, 0), cutoff, true));
        assert!(should_show_late_tracking_reminder(hm(23, 45), cutoff, true));
    }

    #[test]
    fn late_reminder_needs_tracking_and_cutoff() {
        let cutoff = default_cutoff_time();
        assert!(!should_show_late_tracking_reminder(hm(20, 59), cutoff, true));
        assert!(!should_show_late_tracking_reminder(hm(22, 0), cutoff, false));
    }

    #[test]
    fn custom_times_are_respected() {
        assert!(should_show_no_tracking_reminder(hm(8, 30), hm(8, 30), true, false));
        assert!(should_show_late_tracking_reminder(hm(18, 0), hm(17, 45), true));
    }
}

//! Commute-day phase tracking.
//!
//! Phase transitions:
//! - NotStarted -> Outbound: commute starts (home-station geofence entered)
//! - Outbound -> InOffice: office geofence entered
//! - InOffice -> Return: office geofence exited
//! - Return -> InOffice: office geofence re-entered (e.g. forgot something)
//! - Return -> Completed: home station entered on the way back
//! - Outbound -> Completed: home station re-entered without an office visit
//! - any -> NotStarted: reset (tracking stopped or new day)
//!
//! Calls that are invalid for the current phase are silent no-ops; geofence
//! callbacks arrive duplicated and out of order, and absorbing them here
//! keeps every caller free of ordering assumptions. A diagnostic counter
//! records how many calls were absorbed.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

/// Progress through a single commute day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommutePhase {
    /// No commute in flight.
    NotStarted,
    /// On the way to the office.
    Outbound,
    /// At the office.
    InOffice,
    /// On the way home.
    Return,
    /// Arrived home; kept until the next commute starts or a reset.
    Completed,
}

impl CommutePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommutePhase::NotStarted => "NOT_STARTED",
            CommutePhase::Outbound => "OUTBOUND",
            CommutePhase::InOffice => "IN_OFFICE",
            CommutePhase::Return => "RETURN",
            CommutePhase::Completed => "COMPLETED",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown commute phase `{0}`")]
pub struct ParseCommutePhaseError(String);

impl FromStr for CommutePhase {
    type Err = ParseCommutePhaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_STARTED" => Ok(CommutePhase::NotStarted),
            "OUTBOUND" => Ok(CommutePhase::Outbound),
            "IN_OFFICE" => Ok(CommutePhase::InOffice),
            "RETURN" => Ok(CommutePhase::Return),
            "COMPLETED" => Ok(CommutePhase::Completed),
            other => Err(ParseCommutePhaseError(other.to_string())),
        }
    }
}

/// Tracks the current phase of a commute day.
///
/// The phase is held in a watch channel: readers observe the current value
/// and subsequent changes without polling, and transitions are applied as a
/// read-modify-write under the channel's own lock.
pub struct CommutePhaseTracker {
    phase: watch::Sender<CommutePhase>,
    rejected: AtomicU64,
}

impl CommutePhaseTracker {
    pub fn new() -> Self {
        Self::with_phase(CommutePhase::NotStarted)
    }

    /// Starts from a known phase, e.g. one persisted before a process restart.
    pub fn with_phase(initial: CommutePhase) -> Self {
        let (phase, _) = watch::channel(initial);
        Self {
            phase,
            rejected: AtomicU64::new(0),
        }
    }

    /// The current phase.
    pub fn current(&self) -> CommutePhase {
        *self.phase.borrow()
    }

    /// A receiver observing the current phase and its changes.
    pub fn subscribe(&self) -> watch::Receiver<CommutePhase> {
        self.phase.subscribe()
    }

    /// Starts a new commute. Valid from any phase.
    pub fn start_commute(&self) {
        self.apply("start_commute", |_| Some(CommutePhase::Outbound));
    }

    /// Marks entry into the office. Valid from Outbound or Return.
    pub fn enter_office(&self) {
        self.apply("enter_office", |phase| {
            matches!(phase, CommutePhase::Outbound | CommutePhase::Return)
                .then_some(CommutePhase::InOffice)
        });
    }

    /// Marks exit from the office. Valid from InOffice only.
    pub fn exit_office(&self) {
        self.apply("exit_office", |phase| {
            (phase == CommutePhase::InOffice).then_some(CommutePhase::Return)
        });
    }

    /// Marks the commute as completed (arrived home). Valid from Outbound or
    /// Return; the Completed value persists so observers can see it before
    /// the next commute or a reset clears it.
    pub fn complete_commute(&self) {
        self.apply("complete_commute", |phase| {
            matches!(phase, CommutePhase::Outbound | CommutePhase::Return)
                .then_some(CommutePhase::Completed)
        });
    }

    /// Resets to NotStarted. Called when tracking stops.
    pub fn reset(&self) {
        self.apply("reset", |_| Some(CommutePhase::NotStarted));
    }

    /// Number of calls absorbed as invalid for the phase they arrived in.
    pub fn rejected_transitions(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    fn apply(
        &self,
        input: &'static str,
        next: impl FnOnce(CommutePhase) -> Option<CommutePhase>,
    ) {
        self.phase.send_if_modified(|phase| match next(*phase) {
            Some(new) => {
                let changed = new != *phase;
                if changed {
                    log::debug!("commute phase {} -> {} ({input})", phase.as_str(), new.as_str());
                }
                *phase = new;
                changed
            }
            None => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                log::debug!("commute phase {}: {input} ignored", phase.as_str());
                false
            }
        });
    }
}

impl Default for CommutePhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn starts_not_started() {
        let tracker = CommutePhaseTracker::new();
        assert_eq!(tracker.current(), CommutePhase::NotStarted);
    }

    #[test]
    fn resumes_from_a_persisted_phase() {
        let tracker = CommutePhaseTracker::with_phase(CommutePhase::InOffice);
        assert_eq!(tracker.current(), CommutePhase::InOffice);
        tracker.exit_office();
        assert_eq!(tracker.current(), CommutePhase::Return);
    }

    #[test]
    fn phase_strings_round_trip() {
        for phase in [
            CommutePhase::NotStarted,
            CommutePhase::Outbound,
            CommutePhase::InOffice,
            CommutePhase::Return,
            CommutePhase::Completed,
        ] {
            assert_eq!(phase.as_str().parse::<CommutePhase>().unwrap(), phase);
        }
        assert!("ELSEWHERE".parse::<CommutePhase>().is_err());
    }

    #[test]
    fn full_commute_cycle() {
        let tracker = CommutePhaseTracker::new();
        tracker.start_commute();
        assert_eq!(tracker.current(), CommutePhase::Outbound);
        tracker.enter_office();
        assert_eq!(tracker.current(), CommutePhase::InOffice);
        tracker.exit_office();
        assert_eq!(tracker.current(), CommutePhase::Return);
        tracker.complete_commute();
        assert_eq!(tracker.current(), CommutePhase::Completed);
        tracker.reset();
        assert_eq!(tracker.current(), CommutePhase::NotStarted);
    }

    #[test]
    fn completes_directly_from_outbound_without_office_visit() {
        let tracker = CommutePhaseTracker::new();
        tracker.start_commute();
        tracker.complete_commute();
        assert_eq!(tracker.current(), CommutePhase::Completed);
    }

    #[test]
    fn reenters_office_from_return() {
        let tracker = CommutePhaseTracker::new();
        tracker.start_commute();
        tracker.enter_office();
        tracker.exit_office();
        tracker.enter_office();
        assert_eq!(tracker.current(), CommutePhase::InOffice);
    }

    #[test]
    fn invalid_calls_are_ignored() {
        let tracker = CommutePhaseTracker::new();

        tracker.enter_office();
        assert_eq!(tracker.current(), CommutePhase::NotStarted);
        tracker.exit_office();
        assert_eq!(tracker.current(), CommutePhase::NotStarted);
        tracker.complete_commute();
        assert_eq!(tracker.current(), CommutePhase::NotStarted);

        tracker.start_commute();
        tracker.exit_office();
        assert_eq!(tracker.current(), CommutePhase::Outbound);

        tracker.enter_office();
        tracker.complete_commute();
        assert_eq!(tracker.current(), CommutePhase::InOffice);

        assert_eq!(tracker.rejected_transitions(), 5);
    }

    #[test]
    fn completed_ignores_everything_but_restart_and_reset() {
        let tracker = CommutePhaseTracker::new();
        tracker.start_commute();
        tracker.complete_commute();

        tracker.enter_office();
        tracker.exit_office();
        tracker.complete_commute();
        assert_eq!(tracker.current(), CommutePhase::Completed);

        tracker.start_commute();
        assert_eq!(tracker.current(), CommutePhase::Outbound);

        tracker.complete_commute();
        tracker.reset();
        assert_eq!(tracker.current(), CommutePhase::NotStarted);
    }

    #[test]
    fn duplicate_office_entry_is_not_a_change() {
        let tracker = CommutePhaseTracker::new();
        tracker.start_commute();
        tracker.enter_office();
        tracker.enter_office();
        assert_eq!(tracker.current(), CommutePhase::InOffice);
        // the duplicate is a rejected transition, not a value change
        assert_eq!(tracker.rejected_transitions(), 1);
    }

    #[test]
    fn subscribers_observe_changes() {
        let tracker = CommutePhaseTracker::new();
        let mut rx = tracker.subscribe();
        assert_eq!(*rx.borrow_and_update(), CommutePhase::NotStarted);

        tracker.start_commute();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), CommutePhase::Outbound);

        // an ignored call publishes nothing
        tracker.exit_office();
        assert!(!rx.has_changed().unwrap());
    }

    proptest! {
        // Any call sequence leaves the tracker in a defined phase and obeys
        // the transition table step by step.
        #[test]
        fn random_sequences_follow_the_table(calls in prop::collection::vec(0u8..5, 0..64)) {
            let tracker = CommutePhaseTracker::new();
            for call in calls {
                let before = tracker.current();
                let expected = match (call, before) {
                    (0, _) => CommutePhase::Outbound,
                    (1, CommutePhase::Outbound | CommutePhase::Return) => CommutePhase::InOffice,
                    (2, CommutePhase::InOffice) => CommutePhase::Return,
                    (3, CommutePhase::Outbound | CommutePhase::Return) => CommutePhase::Completed,
                    (4, _) => CommutePhase::NotStarted,
                    (_, unchanged) => unchanged,
                };
                match call {
                    0 => tracker.start_commute(),
                    1 => tracker.enter_office(),
                    2 => tracker.exit_office(),
                    3 => tracker.complete_commute(),
                    _ => tracker.reset(),
                }
                prop_assert_eq!(tracker.current(), expected);
            }
        }
    }
}

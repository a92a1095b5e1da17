//! Commute-day logic: phase tracking, day/window checks, and reminders.

mod day_checker;
mod phase;
pub mod reminder;

pub use day_checker::CommuteDayChecker;
pub use phase::{CommutePhase, CommutePhaseTracker, ParseCommutePhaseError};

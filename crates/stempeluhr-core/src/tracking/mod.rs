//! The tracking state machine and its surroundings.

mod event;
mod machine;
mod state;
mod store;

pub use event::TrackingEvent;
pub use machine::TrackingStateMachine;
pub use state::TrackingState;
pub use store::{KvStateStore, MemoryStateStore, StateStore};

//! Tracking session state.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::model::TrackingType;

/// The tracking session state, as published by the state machine and
/// persisted across restarts.
///
/// Serialized with an explicit `state` tag so snapshots stay readable and
/// stable across field reordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingState {
    /// No session open.
    Idle,
    /// A session is running.
    Tracking {
        entry_id: String,
        kind: TrackingType,
        start_time: NaiveDateTime,
    },
    /// A session is open but paused.
    Paused {
        entry_id: String,
        kind: TrackingType,
        pause_id: String,
    },
}

impl TrackingState {
    pub fn is_idle(&self) -> bool {
        matches!(self, TrackingState::Idle)
    }

    /// The id of the open entry, if any.
    pub fn active_entry_id(&self) -> Option<&str> {
        match self {
            TrackingState::Idle => None,
            TrackingState::Tracking { entry_id, .. } | TrackingState::Paused { entry_id, .. } => {
                Some(entry_id)
            }
        }
    }

    /// The type of the open session, if any.
    pub fn kind(&self) -> Option<TrackingType> {
        match self {
            TrackingState::Idle => None,
            TrackingState::Tracking { kind, .. } | TrackingState::Paused { kind, .. } => {
                Some(*kind)
            }
        }
    }
}

//! Persistence of the tracking state across restarts.

use std::sync::Arc;

use crate::error::StorageError;
use crate::storage::Database;
use crate::tracking::TrackingState;

const STATE_KEY: &str = "tracking_state";

/// Stores the machine's state snapshot so a restart can pick up a running
/// session.
pub trait StateStore: Send + Sync {
    fn save(&self, state: &TrackingState) -> Result<(), StorageError>;

    /// Loads the last snapshot. A missing or unreadable snapshot yields
    /// `Idle`; a stale snapshot is not an error worth failing startup over.
    fn load(&self) -> Result<TrackingState, StorageError>;

    fn clear(&self) -> Result<(), StorageError>;
}

/// [`StateStore`] backed by the database's key-value table, as JSON.
pub struct KvStateStore {
    db: Arc<Database>,
}

impl KvStateStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl StateStore for KvStateStore {
    fn save(&self, state: &TrackingState) -> Result<(), StorageError> {
        let json = serde_json::to_string(state)
            .map_err(|e| StorageError::SnapshotEncode(e.to_string()))?;
        self.db.kv_set(STATE_KEY, &json)
    }

    fn load(&self) -> Result<TrackingState, StorageError> {
        match self.db.kv_get(STATE_KEY)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(state) => Ok(state),
                Err(err) => {
                    log::warn!("discarding unreadable tracking state snapshot: {err}");
                    Ok(TrackingState::Idle)
                }
            },
            None => Ok(TrackingState::Idle),
        }
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.db.kv_delete(STATE_KEY)
    }
}

/// In-memory [`StateStore`] for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStateStore {
    state: std::sync::Mutex<Option<TrackingState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn save(&self, state: &TrackingState) -> Result<(), StorageError> {
        let mut slot = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(state.clone());
        Ok(())
    }

    fn load(&self) -> Result<TrackingState, StorageError> {
        let slot = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slot.clone().unwrap_or(TrackingState::Idle))
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut slot = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
        Ok(())
    }
}

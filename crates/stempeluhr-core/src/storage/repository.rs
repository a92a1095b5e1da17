//! Repository abstraction over tracking-entry persistence.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::StorageError;
use crate::model::{EntryWithPauses, Pause, TrackingEntry};

/// Persistence for tracking entries and their pauses.
///
/// [`Database`](super::Database) implements this against SQLite; tests swap
/// in doubles that fail on demand. Closing operations only touch rows that
/// are still open, so a replayed stale event cannot rewrite history.
pub trait TrackingRepository: Send + Sync {
    /// Inserts a new entry.
    fn create_entry(&self, entry: &TrackingEntry) -> Result<(), StorageError>;

    /// Sets the end time of entry `id`, provided it is still open.
    fn close_entry(&self, id: &str, end: NaiveDateTime) -> Result<(), StorageError>;

    /// Inserts a new pause.
    fn create_pause(&self, pause: &Pause) -> Result<(), StorageError>;

    /// Sets the end time of pause `id`, provided it is still open.
    fn close_pause(&self, id: &str, end: NaiveDateTime) -> Result<(), StorageError>;

    /// The single open entry, if any.
    fn active_entry(&self) -> Result<Option<TrackingEntry>, StorageError>;

    /// Entries whose date lies in `start..=end`, each with its pauses,
    /// ordered by date and start time.
    fn entries_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EntryWithPauses>, StorageError>;

    /// Whether any entry exists on `date`.
    fn has_entry_on(&self, date: NaiveDate) -> Result<bool, StorageError>;
}

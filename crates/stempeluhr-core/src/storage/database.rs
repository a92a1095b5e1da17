//! SQLite-backed storage for tracking entries and pauses.
//!
//! Provides persistent storage for:
//! - Tracking entries and the pauses inside them
//! - Key-value store for application state, e.g. the machine snapshot
//!
//! Timestamps are stored as local wall-clock text (`%Y-%m-%dT%H:%M:%S`),
//! dates as `%Y-%m-%d`. The connection sits behind a mutex so one database
//! handle can be shared across threads.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};

use crate::error::StorageError;
use crate::model::{EntryWithPauses, ParseTrackingTypeError, Pause, TrackingEntry};

use super::TrackingRepository;

const DB_FILE: &str = "stempeluhr.db";
const DT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite database for tracking entries.
///
/// Implements [`TrackingRepository`] and carries the key-value store the
/// state snapshot lives in.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open the database at `<data dir>/stempeluhr.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> crate::error::Result<Self> {
        let path = super::data_dir()?.join(DB_FILE);
        Ok(Self::open_at(&path)?)
    }

    /// Open the database at an explicit path, creating the schema as needed.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|e| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::OpenFailed {
            path: std::path::PathBuf::from(":memory:"),
            source: e,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(db)
    }

    fn migrate(&self) -> rusqlite::Result<()> {
        self.conn().execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS tracking_entries (
                id            TEXT PRIMARY KEY,
                date          TEXT NOT NULL,
                kind          TEXT NOT NULL,
                start_time    TEXT NOT NULL,
                end_time      TEXT,
                auto_detected INTEGER NOT NULL DEFAULT 0,
                confirmed     INTEGER NOT NULL DEFAULT 0,
                notes         TEXT
            );

            CREATE TABLE IF NOT EXISTS pauses (
                id         TEXT PRIMARY KEY,
                entry_id   TEXT NOT NULL REFERENCES tracking_entries(id) ON DELETE CASCADE,
                start_time TEXT NOT NULL,
                end_time   TEXT
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- Range queries scan by date; the open entry is found by end_time
            CREATE INDEX IF NOT EXISTS idx_entries_date ON tracking_entries(date);
            CREATE INDEX IF NOT EXISTS idx_entries_end_time ON tracking_entries(end_time);
            CREATE INDEX IF NOT EXISTS idx_pauses_entry_id ON pauses(entry_id);",
        )
    }

    /// One entry with its pauses, or `None` for an unknown id.
    pub fn entry_with_pauses(&self, id: &str) -> Result<Option<EntryWithPauses>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, date, kind, start_time, end_time, auto_detected, confirmed, notes
             FROM tracking_entries WHERE id = ?1",
        )?;
        let entry = match stmt.query_row(params![id], entry_from_row) {
            Ok(entry) => entry,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let pauses = pauses_for(&conn, &entry.id)?;
        Ok(Some(EntryWithPauses { entry, pauses }))
    }

    /// Marks an entry as confirmed (or not). Returns whether a row matched.
    pub fn set_confirmed(&self, id: &str, confirmed: bool) -> Result<bool, StorageError> {
        let changed = self.conn().execute(
            "UPDATE tracking_entries SET confirmed = ?2 WHERE id = ?1",
            params![id, confirmed],
        )?;
        Ok(changed > 0)
    }

    /// Replaces an entry's note. Returns whether a row matched.
    pub fn set_notes(&self, id: &str, notes: Option<&str>) -> Result<bool, StorageError> {
        let changed = self.conn().execute(
            "UPDATE tracking_entries SET notes = ?2 WHERE id = ?1",
            params![id, notes],
        )?;
        Ok(changed > 0)
    }

    /// Deletes an entry; its pauses cascade. Returns whether a row matched.
    pub fn delete_entry(&self, id: &str) -> Result<bool, StorageError> {
        let changed = self
            .conn()
            .execute("DELETE FROM tracking_entries WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a value from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl TrackingRepository for Database {
    fn create_entry(&self, entry: &TrackingEntry) -> Result<(), StorageError> {
        self.conn().execute(
            "INSERT INTO tracking_entries
                 (id, date, kind, start_time, end_time, auto_detected, confirmed, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.id,
                fmt_date(entry.date),
                entry.kind.as_str(),
                fmt_dt(entry.start_time),
                entry.end_time.map(fmt_dt),
                entry.auto_detected,
                entry.confirmed,
                entry.notes,
            ],
        )?;
        Ok(())
    }

    fn close_entry(&self, id: &str, end: NaiveDateTime) -> Result<(), StorageError> {
        self.conn().execute(
            "UPDATE tracking_entries SET end_time = ?2 WHERE id = ?1 AND end_time IS NULL",
            params![id, fmt_dt(end)],
        )?;
        Ok(())
    }

    fn create_pause(&self, pause: &Pause) -> Result<(), StorageError> {
        self.conn().execute(
            "INSERT INTO pauses (id, entry_id, start_time, end_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                pause.id,
                pause.entry_id,
                fmt_dt(pause.start_time),
                pause.end_time.map(fmt_dt),
            ],
        )?;
        Ok(())
    }

    fn close_pause(&self, id: &str, end: NaiveDateTime) -> Result<(), StorageError> {
        self.conn().execute(
            "UPDATE pauses SET end_time = ?2 WHERE id = ?1 AND end_time IS NULL",
            params![id, fmt_dt(end)],
        )?;
        Ok(())
    }

    fn active_entry(&self) -> Result<Option<TrackingEntry>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, date, kind, start_time, end_time, auto_detected, confirmed, notes
             FROM tracking_entries
             WHERE end_time IS NULL
             ORDER BY start_time DESC
             LIMIT 1",
        )?;
        let result = stmt.query_row([], entry_from_row);
        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn entries_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EntryWithPauses>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, date, kind, start_time, end_time, auto_detected, confirmed, notes
             FROM tracking_entries
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date, start_time",
        )?;
        let entries = stmt
            .query_map(params![fmt_date(start), fmt_date(end)], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut result = Vec::with_capacity(entries.len());
        for entry in entries {
            let pauses = pauses_for(&conn, &entry.id)?;
            result.push(EntryWithPauses { entry, pauses });
        }
        Ok(result)
    }

    fn has_entry_on(&self, date: NaiveDate) -> Result<bool, StorageError> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM tracking_entries WHERE date = ?1",
            params![fmt_date(date)],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

fn fmt_dt(dt: NaiveDateTime) -> String {
    dt.format(DT_FORMAT).to_string()
}

fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_dt(idx: usize, value: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DT_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_date(idx: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrackingEntry> {
    let date: String = row.get(1)?;
    let kind: String = row.get(2)?;
    let start_time: String = row.get(3)?;
    let end_time: Option<String> = row.get(4)?;
    Ok(TrackingEntry {
        id: row.get(0)?,
        date: parse_date(1, &date)?,
        kind: kind.parse().map_err(|e: ParseTrackingTypeError| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        start_time: parse_dt(3, &start_time)?,
        end_time: end_time.map(|s| parse_dt(4, &s)).transpose()?,
        auto_detected: row.get(5)?,
        confirmed: row.get(6)?,
        notes: row.get(7)?,
    })
}

fn pause_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Pause> {
    let start_time: String = row.get(2)?;
    let end_time: Option<String> = row.get(3)?;
    Ok(Pause {
        id: row.get(0)?,
        entry_id: row.get(1)?,
        start_time: parse_dt(2, &start_time)?,
        end_time: end_time.map(|s| parse_dt(3, &s)).transpose()?,
    })
}

fn pauses_for(conn: &Connection, entry_id: &str) -> rusqlite::Result<Vec<Pause>> {
    let mut stmt = conn.prepare(
        "SELECT id, entry_id, start_time, end_time FROM pauses
         WHERE entry_id = ?1 ORDER BY start_time",
    )?;
    let rows = stmt.query_map(params![entry_id], pause_from_row)?;
    rows.collect()
}

//! Error types for stempeluhr-core.
//!
//! Invalid state-machine transitions are deliberately not represented here:
//! noisy or out-of-order sensor callbacks are absorbed as silent no-ops.
//! Everything that does fail (storage, configuration, export I/O) propagates
//! to the caller, which owns the retry policy.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stempeluhr-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence errors from the tracking store
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// CSV export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the tracking repository and key-value store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// State snapshot could not be encoded
    #[error("Failed to encode state snapshot: {0}")]
    SnapshotEncode(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors while writing an export document.
///
/// A failed export never leaves a partial document behind; output is written
/// to a temporary file and published by rename only on success.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Failed to write the export document
    #[error("Failed to write export to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Export target is not a usable directory
    #[error("Export target {path} is not a directory")]
    NotADirectory { path: PathBuf },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

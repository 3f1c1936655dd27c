//! Core error types for studyroom-core.
//!
//! Expected runtime failures (missing rules, corrupt blobs, sink rejections)
//! are values, not panics: operations return explicit results and degrade
//! where the contract calls for it.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studyroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Notification sink errors
    #[error("Notification error: {0}")]
    Sink(#[from] SinkError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing store
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Store query failed: {0}")]
    QueryFailed(String),

    /// Store is locked by another access
    #[error("Store is locked")]
    Locked,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reminder validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Weekly rule with no selected weekdays would never fire
    #[error("Weekly rule has an empty weekday set")]
    EmptyWeekdays,

    /// Weekday outside 0..=6
    #[error("Weekday {0} is out of range (0 = Sunday .. 6 = Saturday)")]
    InvalidWeekday(u8),

    /// Day of month outside 1..=31
    #[error("Day of month {0} is out of range (1..=31)")]
    InvalidDayOfMonth(u8),

    /// Malformed wall-clock time
    #[error("Invalid clock time '{0}' (expected HH:mm)")]
    InvalidClockTime(String),

    /// Invalid field value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Platform notification sink errors.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Notification permission has not been granted
    #[error("Notification permission denied")]
    PermissionDenied,

    /// The sink rejected one scheduling request
    #[error("Sink rejected trigger '{trigger_id}': {message}")]
    Rejected { trigger_id: String, message: String },

    /// The sink could not be reached at all
    #[error("Notification sink unavailable: {0}")]
    Unavailable(String),
}

// Helper implementations for converting from backend error types

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

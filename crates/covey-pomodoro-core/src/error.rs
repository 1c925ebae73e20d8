//! Core error types for covey-pomodoro-core.
//!
//! This module defines the error hierarchy using thiserror. Storage and
//! configuration failures have their own enums; `TimerError` covers the
//! failures a timer controller reports to its caller.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for covey-pomodoro-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Timer controller errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rejected user input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
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

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Row lookup by id found nothing
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
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

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors reported by [`crate::TimerController`].
///
/// None of these leave the engine in an inconsistent state: the countdown is
/// stopped and unsaved elapsed time is kept so the caller can retry.
#[derive(Error, Debug)]
pub enum TimerError {
    /// Writing the session record failed. Elapsed time is still in the engine.
    #[error("Failed to persist session record: {0}")]
    Persistence(#[source] DatabaseError),

    /// The session record was written but adding its time to the task failed.
    #[error("Session {record_id} saved but updating time spent on task '{task_id}' failed: {source}")]
    TaskTimeUpdate {
        record_id: String,
        task_id: String,
        /// Seconds that still need to be added to the task.
        seconds: u64,
        #[source]
        source: DatabaseError,
    },

    /// A save was requested while another one was in flight.
    #[error("A save is already in progress")]
    ConcurrentSaveRejected,

    /// The tick scheduler could not arm a wake-up. The timer was stopped.
    #[error("Failed to schedule timer tick: {0}")]
    Scheduler(#[from] SchedulerError),
}

/// Scheduler port failure.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// No async runtime is available to drive ticks.
    #[error("no runtime available to drive timer ticks")]
    NoRuntime,

    #[error("{0}")]
    Other(String),
}

/// Notification sink failure. Always ignored by the timer.
#[derive(Error, Debug)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked
                    || err.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

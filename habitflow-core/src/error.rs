//! Error types for habitflow-core

use thiserror::Error;

/// Main error type for the habitflow-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error for stored blobs
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller supplied a malformed or out-of-range value
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Habit not found
    #[error("habit not found: {0}")]
    HabitNotFound(String),

    /// Key-value store failure that is not a SQLite error (e.g. poisoned lock)
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}

/// Result type alias for habitflow-core
pub type Result<T> = std::result::Result<T, Error>;

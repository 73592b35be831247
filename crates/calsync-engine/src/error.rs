//! Engine error types.

use std::io;
use std::path::PathBuf;

use calsync_providers::ProviderError;
use thiserror::Error;

/// Result type for engine construction.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type for key-value store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while building a [`CalendarSync`](crate::CalendarSync).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The cloud-source pattern is not a valid regular expression.
    #[error("Invalid cloud source pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The ledger namespace is empty.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl EngineError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Errors from a [`KeyValueStore`](crate::KeyValueStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error reading or writing the backing file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The backing file does not hold a JSON object of strings.
    #[error("Corrupt store file {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    /// Serializing the entries failed.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Store-specific failure.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Creates a corrupt-file error.
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Failure of the day-window sweep.
///
/// Never surfaced to callers: the orchestrator logs it and continues as if
/// no duplicate was found.
#[derive(Debug, Error)]
#[error("Duplicate sweep failed: {0}")]
pub struct SweepCheckFailed(#[from] pub ProviderError);

/// Unsuccessful sync outcomes, for callers that prefer `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Calendar access was not granted.
    #[error("Calendar access was denied; allow it in the system settings")]
    PermissionDenied,

    /// No calendar exists and none could be created.
    #[error("No calendar is available on this device")]
    NoCalendarAvailable,

    /// The provider failed while adding the entry.
    #[error("Could not add the event to the calendar: {0}")]
    WriteFailed(String),
}

//! Core error types.

use thiserror::Error;

/// Errors raised while building core values from external input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A timestamp string could not be parsed as ISO-8601.
    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// A UTC offset string could not be parsed.
    #[error("invalid UTC offset '{0}' (expected 'utc', 'local' or '+HH:MM')")]
    InvalidOffset(String),
}

impl CoreError {
    /// Creates an invalid timestamp error.
    pub fn invalid_timestamp(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

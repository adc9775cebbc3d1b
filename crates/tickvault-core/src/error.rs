//! Error types for the core market data types.

use thiserror::Error;

/// A specialized Result type for core type operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building or parsing core types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Interval text did not match any known bar interval.
    #[error("Invalid interval: '{value}'")]
    InvalidInterval {
        /// The text that failed to parse.
        value: String,
    },

    /// Time zone text was not a fixed offset or `UTC`.
    #[error("Invalid time zone: '{value}' - {reason}")]
    InvalidTimeZone {
        /// The text that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl CoreError {
    /// Creates an invalid interval error.
    #[must_use]
    pub fn invalid_interval(value: impl Into<String>) -> Self {
        Self::InvalidInterval {
            value: value.into(),
        }
    }

    /// Creates an invalid time zone error.
    #[must_use]
    pub fn invalid_time_zone(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTimeZone {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

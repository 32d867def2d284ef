//! Timer engine error types.
//!
//! Invalid state transitions are not errors (they are silent no-ops), so
//! these types only cover programming errors, an unavailable time source,
//! and settings rejected by front-end validation.

use thiserror::Error;

/// Errors raised by the timer engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// An argument outside the accepted domain, such as an unknown session type name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No tick driver could be created (e.g. no tokio runtime is running).
    #[error("tick scheduler unavailable: {0}")]
    SchedulerUnavailable(String),
}

impl TimerError {
    /// Returns true if this error indicates a defect in the caller.
    #[must_use]
    pub fn is_programming_error(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// A settings value rejected by [`TimerSettings::validate`](crate::types::TimerSettings::validate).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// A duration outside its allowed range (all values in seconds).
    #[error("{field} must be between {min} and {max} seconds (got {value})")]
    DurationOutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// The number of work sessions before a long break is outside its range.
    #[error("sessionsBeforeLongBreak must be between {min} and {max} (got {value})")]
    SessionsOutOfRange { value: u32, min: u32, max: u32 },
}

impl SettingsError {
    /// Returns the camelCase name of the offending field.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::DurationOutOfRange { field, .. } => field,
            Self::SessionsOutOfRange { .. } => "sessionsBeforeLongBreak",
        }
    }
}

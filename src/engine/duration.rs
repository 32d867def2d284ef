//! Duration policy: how long each session type lasts under given settings.

use crate::engine::TimerError;
use crate::types::{SessionType, TimerSettings};

/// Shortest countdown the state machine will ever run, in seconds.
pub const MIN_DURATION_SECS: u32 = 1;

/// Returns the configured duration in seconds for `session_type`.
pub fn duration_for(session_type: SessionType, settings: &TimerSettings) -> u32 {
    match session_type {
        SessionType::Work => settings.work_duration,
        SessionType::ShortBreak => settings.short_break_duration,
        SessionType::LongBreak => settings.long_break_duration,
    }
}

/// Looks up a duration by session type name (`"work"`, `"shortBreak"`, `"longBreak"`).
///
/// # Errors
///
/// Returns [`TimerError::InvalidArgument`] for any other name.
pub fn duration_for_name(name: &str, settings: &TimerSettings) -> Result<u32, TimerError> {
    let session_type: SessionType = name.parse()?;
    Ok(duration_for(session_type, settings))
}

/// The duration the state machine actually counts down.
///
/// Unvalidated settings may carry a zero duration; it is clamped to
/// [`MIN_DURATION_SECS`] so a countdown can never start at zero.
pub fn effective_duration(session_type: SessionType, settings: &TimerSettings) -> u32 {
    duration_for(session_type, settings).max(MIN_DURATION_SECS)
}

/// Work sessions per long break, never zero.
pub fn long_break_interval(settings: &TimerSettings) -> u32 {
    settings.sessions_before_long_break.max(1)
}

//! Core data types for the study timer.
//!
//! This module defines the data structures used for:
//! - Session types and the session snapshot handed to observers
//! - Timer settings with defaults, partial updates and validation
//! - The completion descriptor returned when a session finishes
//!
//! All types serialize with camelCase field names so the persisted settings
//! blob keeps the shape the front-end has always written.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::{SettingsError, TimerError};

// ============================================================================
// SessionType
// ============================================================================

/// The kind of interval the timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionType {
    /// Focused work session
    Work,
    /// Short break between work sessions
    ShortBreak,
    /// Long break after every `sessionsBeforeLongBreak` work sessions
    LongBreak,
}

impl SessionType {
    /// Every session type, in cycle order.
    pub const ALL: [SessionType; 3] = [
        SessionType::Work,
        SessionType::ShortBreak,
        SessionType::LongBreak,
    ];

    /// Returns the wire name of the session type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::ShortBreak => "shortBreak",
            SessionType::LongBreak => "longBreak",
        }
    }

    /// Returns true for either kind of break.
    pub fn is_break(&self) -> bool {
        matches!(self, SessionType::ShortBreak | SessionType::LongBreak)
    }
}

impl Default for SessionType {
    fn default() -> Self {
        SessionType::Work
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = TimerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(SessionType::Work),
            "shortBreak" => Ok(SessionType::ShortBreak),
            "longBreak" => Ok(SessionType::LongBreak),
            other => Err(TimerError::InvalidArgument(format!(
                "unknown session type '{other}'"
            ))),
        }
    }
}

// ============================================================================
// TimerSettings
// ============================================================================

/// Default work duration (25 minutes).
pub const DEFAULT_WORK_DURATION: u32 = 25 * 60;
/// Default short break duration (5 minutes).
pub const DEFAULT_SHORT_BREAK_DURATION: u32 = 5 * 60;
/// Default long break duration (15 minutes).
pub const DEFAULT_LONG_BREAK_DURATION: u32 = 15 * 60;
/// Default number of work sessions before a long break.
pub const DEFAULT_SESSIONS_BEFORE_LONG_BREAK: u32 = 4;

/// User-configurable timer settings. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerSettings {
    /// Work session duration in seconds
    pub work_duration: u32,
    /// Short break duration in seconds
    pub short_break_duration: u32,
    /// Long break duration in seconds
    pub long_break_duration: u32,
    /// Completed work sessions between long breaks
    pub sessions_before_long_break: u32,
    /// Start a break automatically when a work session completes
    pub auto_start_breaks: bool,
    /// Start a work session automatically when a break completes
    pub auto_start_sessions: bool,
    /// Whether the front-end should play a sound on completion
    pub sound_enabled: bool,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_duration: DEFAULT_WORK_DURATION,
            short_break_duration: DEFAULT_SHORT_BREAK_DURATION,
            long_break_duration: DEFAULT_LONG_BREAK_DURATION,
            sessions_before_long_break: DEFAULT_SESSIONS_BEFORE_LONG_BREAK,
            auto_start_breaks: false,
            auto_start_sessions: false,
            sound_enabled: true,
        }
    }
}

impl TimerSettings {
    /// Work duration bounds accepted by [`validate`](Self::validate) (1-120 minutes).
    pub const WORK_RANGE: (u32, u32) = (60, 120 * 60);
    /// Short break bounds (1-60 minutes).
    pub const SHORT_BREAK_RANGE: (u32, u32) = (60, 60 * 60);
    /// Long break bounds (1-120 minutes).
    pub const LONG_BREAK_RANGE: (u32, u32) = (60, 120 * 60);
    /// Bounds for `sessions_before_long_break`.
    pub const SESSIONS_RANGE: (u32, u32) = (2, 10);

    /// Returns the settings with the given work duration.
    pub fn with_work_duration(mut self, seconds: u32) -> Self {
        self.work_duration = seconds;
        self
    }

    /// Returns the settings with the given short break duration.
    pub fn with_short_break_duration(mut self, seconds: u32) -> Self {
        self.short_break_duration = seconds;
        self
    }

    /// Returns the settings with the given long break duration.
    pub fn with_long_break_duration(mut self, seconds: u32) -> Self {
        self.long_break_duration = seconds;
        self
    }

    /// Returns the settings with the given long break interval.
    pub fn with_sessions_before_long_break(mut self, sessions: u32) -> Self {
        self.sessions_before_long_break = sessions;
        self
    }

    /// Returns the settings with the given auto-start flags.
    pub fn with_auto_start(mut self, breaks: bool, sessions: bool) -> Self {
        self.auto_start_breaks = breaks;
        self.auto_start_sessions = sessions;
        self
    }

    /// Merges every field present in `patch` into these settings.
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.work_duration {
            self.work_duration = v;
        }
        if let Some(v) = patch.short_break_duration {
            self.short_break_duration = v;
        }
        if let Some(v) = patch.long_break_duration {
            self.long_break_duration = v;
        }
        if let Some(v) = patch.sessions_before_long_break {
            self.sessions_before_long_break = v;
        }
        if let Some(v) = patch.auto_start_breaks {
            self.auto_start_breaks = v;
        }
        if let Some(v) = patch.auto_start_sessions {
            self.auto_start_sessions = v;
        }
        if let Some(v) = patch.sound_enabled {
            self.sound_enabled = v;
        }
    }

    /// Validates the settings against the ranges the settings form accepts.
    ///
    /// The engine never calls this; it is for front-ends to reject input
    /// before it reaches [`TimerEngine::update_settings`](crate::engine::TimerEngine::update_settings).
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_duration("workDuration", self.work_duration, Self::WORK_RANGE)?;
        check_duration(
            "shortBreakDuration",
            self.short_break_duration,
            Self::SHORT_BREAK_RANGE,
        )?;
        check_duration(
            "longBreakDuration",
            self.long_break_duration,
            Self::LONG_BREAK_RANGE,
        )?;

        let (min, max) = Self::SESSIONS_RANGE;
        if !(min..=max).contains(&self.sessions_before_long_break) {
            return Err(SettingsError::SessionsOutOfRange {
                value: self.sessions_before_long_break,
                min,
                max,
            });
        }
        Ok(())
    }
}

fn check_duration(field: &'static str, value: u32, (min, max): (u32, u32)) -> Result<(), SettingsError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::DurationOutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

// ============================================================================
// SettingsPatch
// ============================================================================

/// A partial settings update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_break_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_before_long_break: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start_breaks: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start_sessions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
}

impl SettingsPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<TimerSettings> for SettingsPatch {
    fn from(settings: TimerSettings) -> Self {
        Self {
            work_duration: Some(settings.work_duration),
            short_break_duration: Some(settings.short_break_duration),
            long_break_duration: Some(settings.long_break_duration),
            sessions_before_long_break: Some(settings.sessions_before_long_break),
            auto_start_breaks: Some(settings.auto_start_breaks),
            auto_start_sessions: Some(settings.auto_start_sessions),
            sound_enabled: Some(settings.sound_enabled),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Which of the three mutually exclusive states a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
        }
    }
}

/// Snapshot of the live session.
///
/// The engine owns the only mutable instance; observers and getters receive
/// clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Kind of the current session
    #[serde(rename = "type")]
    pub session_type: SessionType,
    /// Seconds left in the current leg
    pub time_remaining: u32,
    /// Length of the current leg in seconds
    pub total_time: u32,
    /// Completed work sessions
    pub session_count: u32,
    /// A driver is (conceptually) attached; stays true while paused
    pub is_running: bool,
    /// Countdown suspended by the user
    pub is_paused: bool,
}

impl Session {
    /// Creates an idle session of the given type with a full countdown.
    pub fn new(session_type: SessionType, duration: u32) -> Self {
        Self {
            session_type,
            time_remaining: duration,
            total_time: duration,
            session_count: 0,
            is_running: false,
            is_paused: false,
        }
    }

    /// Returns the derived idle / running / paused status.
    pub fn status(&self) -> SessionStatus {
        match (self.is_running, self.is_paused) {
            (true, true) => SessionStatus::Paused,
            (true, false) => SessionStatus::Running,
            _ => SessionStatus::Idle,
        }
    }

    /// Returns true while ticks should decrement the countdown.
    pub fn is_ticking(&self) -> bool {
        self.status() == SessionStatus::Running
    }

    /// Returns true if no countdown is in progress.
    pub fn is_idle(&self) -> bool {
        self.status() == SessionStatus::Idle
    }

    /// Seconds elapsed in the current leg.
    pub fn elapsed(&self) -> u32 {
        self.total_time.saturating_sub(self.time_remaining)
    }

    /// Percentage (0.0 - 100.0) of the current leg that has elapsed.
    pub fn progress(&self) -> f64 {
        if self.total_time == 0 {
            return 0.0;
        }
        f64::from(self.elapsed()) / f64::from(self.total_time) * 100.0
    }
}

// ============================================================================
// CompletionInfo
// ============================================================================

/// Describes a completed session so front-ends can announce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionInfo {
    /// The session type that just finished
    pub completed_type: SessionType,
    /// The session type the engine moved to
    pub next_type: SessionType,
    /// Completed work sessions after this transition
    pub session_count: u32,
}

// ============================================================================
// Tests
// ============================================================================

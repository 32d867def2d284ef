//! Session state machine.
//!
//! Pure transition logic with no clock, no locking and no I/O. The
//! [`TimerEngine`](super::TimerEngine) wraps it with a tick driver, settings
//! persistence and observer fan-out.
//!
//! ```text
//!            start            pause
//!   Idle ───────────▶ Running ───────▶ Paused
//!    ▲                 │   ▲             │
//!    │ stop / finish   │   └─── start ───┘
//!    └─────────────────┘
//! ```

use super::duration::{effective_duration, long_break_interval};
use crate::types::{CompletionInfo, Session, SessionType, TimerSettings};

/// Result of delivering one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session was not counting down; nothing changed.
    Ignored,
    /// One second was subtracted and time remains.
    Counted,
    /// The countdown reached zero; the completion transition must run.
    Finished,
}

/// Outcome of a completion transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Descriptor for front-ends
    pub completion: CompletionInfo,
    /// Whether the next session was started automatically
    pub auto_started: bool,
}

/// Owns the single mutable [`Session`].
#[derive(Debug, Clone)]
pub struct SessionMachine {
    session: Session,
}

impl SessionMachine {
    /// Creates an idle work session sized from `settings`.
    pub fn new(settings: &TimerSettings) -> Self {
        Self {
            session: Session::new(
                SessionType::Work,
                effective_duration(SessionType::Work, settings),
            ),
        }
    }

    /// Returns the live session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns an owned copy of the live session.
    pub fn snapshot(&self) -> Session {
        self.session.clone()
    }

    /// Starts from idle or resumes from paused.
    ///
    /// Returns false (and changes nothing) if the session is already running.
    pub fn start(&mut self) -> bool {
        if self.session.is_paused {
            self.session.is_paused = false;
            true
        } else if !self.session.is_running {
            self.session.is_running = true;
            true
        } else {
            false
        }
    }

    /// Suspends a running countdown, keeping the remaining time.
    ///
    /// Returns false if the session is idle or already paused.
    pub fn pause(&mut self) -> bool {
        if !self.session.is_ticking() {
            return false;
        }
        self.session.is_paused = true;
        true
    }

    /// Returns to idle with a full countdown for the current type.
    ///
    /// The session type and the completed-session count are kept.
    pub fn stop(&mut self, settings: &TimerSettings) {
        self.session.is_running = false;
        self.session.is_paused = false;
        self.reset(settings);
    }

    /// Recomputes the countdown for the current type from `settings`.
    ///
    /// Leaves the type, the run flags and the session count untouched.
    pub fn reset(&mut self, settings: &TimerSettings) {
        let duration = effective_duration(self.session.session_type, settings);
        self.session.total_time = duration;
        self.session.time_remaining = duration;
    }

    /// Subtracts one second while running.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.session.is_ticking() {
            return TickOutcome::Ignored;
        }
        self.session.time_remaining = self.session.time_remaining.saturating_sub(1);
        if self.session.time_remaining == 0 {
            TickOutcome::Finished
        } else {
            TickOutcome::Counted
        }
    }

    /// Finishes the current session and moves to the next one.
    ///
    /// The machine always comes to rest idle at the boundary and is then
    /// restarted if the matching auto-start flag is set.
    pub fn complete(&mut self, settings: &TimerSettings) -> Transition {
        let completed_type = self.session.session_type;
        let was_work = completed_type == SessionType::Work;

        if was_work {
            self.session.session_count = self.session.session_count.saturating_add(1);
        }

        let next_type = next_session_type(completed_type, self.session.session_count, settings);

        let duration = effective_duration(next_type, settings);
        self.session.session_type = next_type;
        self.session.total_time = duration;
        self.session.time_remaining = duration;
        self.session.is_running = false;
        self.session.is_paused = false;

        let auto_start = if was_work {
            settings.auto_start_breaks
        } else {
            settings.auto_start_sessions
        };
        if auto_start {
            self.start();
        }

        Transition {
            completion: CompletionInfo {
                completed_type,
                next_type,
                session_count: self.session.session_count,
            },
            auto_started: auto_start,
        }
    }
}

/// Chooses the session that follows `finished`.
///
/// `session_count` is the completed work count *after* the finished session
/// has been counted.
pub fn next_session_type(
    finished: SessionType,
    session_count: u32,
    settings: &TimerSettings,
) -> SessionType {
    match finished {
        SessionType::Work if session_count % long_break_interval(settings) == 0 => {
            SessionType::LongBreak
        }
        SessionType::Work => SessionType::ShortBreak,
        SessionType::ShortBreak | SessionType::LongBreak => SessionType::Work,
    }
}

// ============================================================================
// Tests
// ============================================================================

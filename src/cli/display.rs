//! Display utilities for the study timer CLI.
//!
//! This module provides formatted output for:
//! - The live status line while the timer runs
//! - Completion and control messages
//! - Settings listings
//! - Error messages
//!
//! Every message is built by a `*_text`/`*_line` function so the wording can
//! be tested without capturing stdout.

use std::io::{self, Write};

use super::runner::RunSummary;
use crate::types::{CompletionInfo, Session, SessionStatus, SessionType, TimerSettings};

/// ASCII bell, rung on completion when sound is enabled.
pub const BELL: &str = "\x07";

const PROGRESS_WIDTH: usize = 20;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Formats seconds as `MM:SS` (minutes may exceed two digits).
    pub fn format_time(total_seconds: u32) -> String {
        format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
    }

    /// Human-readable name of a session type.
    pub fn session_label(session_type: SessionType) -> &'static str {
        match session_type {
            SessionType::Work => "Focus Session",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        }
    }

    /// Human-readable name of a session status.
    pub fn status_label(status: SessionStatus) -> &'static str {
        match status {
            SessionStatus::Idle => "Ready",
            SessionStatus::Running => "Running",
            SessionStatus::Paused => "Paused",
        }
    }

    /// One-line summary of a session, e.g.
    /// `Focus Session  24:59  [#...................]   0%  Running  (sessions: 0)`.
    pub fn status_line(session: &Session) -> String {
        let progress = session.progress();
        let filled = ((progress / 100.0) * PROGRESS_WIDTH as f64).round() as usize;
        let filled = filled.min(PROGRESS_WIDTH);

        format!(
            "{:<13}  {}  [{}{}] {:>3.0}%  {:<7}  (sessions: {})",
            Self::session_label(session.session_type),
            Self::format_time(session.time_remaining),
            "#".repeat(filled),
            ".".repeat(PROGRESS_WIDTH - filled),
            progress,
            Self::status_label(session.status()),
            session.session_count,
        )
    }

    /// Redraws the status line in place.
    pub fn show_status_line(session: &Session) {
        let mut stdout = io::stdout().lock();
        // a failed redraw is not worth aborting the timer for
        let _ = write!(stdout, "\r{}", Self::status_line(session));
        let _ = stdout.flush();
    }

    /// Messages announcing a completion, in display order.
    pub fn completion_text(info: &CompletionInfo) -> Vec<String> {
        match info.completed_type {
            SessionType::Work => {
                let next = if info.next_type == SessionType::LongBreak {
                    "Time for a long break! Great work!"
                } else {
                    "Time for a short break!"
                };
                vec![
                    format!("Focus session completed! Sessions: {}", info.session_count),
                    next.to_string(),
                ]
            }
            SessionType::ShortBreak | SessionType::LongBreak => {
                vec!["Break completed! Ready to focus?".to_string()]
            }
        }
    }

    /// Shows the completion messages, ringing the bell if `ring` is set.
    pub fn show_completion(info: &CompletionInfo, ring: bool) {
        println!();
        for line in Self::completion_text(info) {
            println!("* {}", line);
        }
        if ring {
            print!("{}", BELL);
            let _ = io::stdout().flush();
        }
    }

    /// Shows the banner printed when the run loop starts.
    pub fn show_run_banner(session: &Session) {
        println!(
            "Study Timer: {} ({})",
            Self::session_label(session.session_type),
            Self::format_time(session.total_time)
        );
        println!("Commands: [r]un/resume  [p]ause  [s]top  [n]ext  [q]uit");
    }

    /// Text printed when the run loop exits.
    pub fn run_summary_text(summary: &RunSummary) -> String {
        format!(
            "Completed {} focus {} and {} {} this run.",
            summary.focus_sessions,
            plural(summary.focus_sessions, "session", "sessions"),
            summary.breaks,
            plural(summary.breaks, "break", "breaks"),
        )
    }

    /// Shows the run summary.
    pub fn show_run_summary(summary: &RunSummary) {
        println!("{}", Self::run_summary_text(summary));
    }

    /// Text shown after a control command takes effect.
    pub fn control_text(status: SessionStatus) -> &'static str {
        match status {
            SessionStatus::Running => "Timer started! Stay focused!",
            SessionStatus::Paused => "Timer paused. Take a moment to recharge.",
            SessionStatus::Idle => "Timer stopped. Session reset.",
        }
    }

    /// Lines describing `settings`, durations in minutes.
    pub fn settings_lines(settings: &TimerSettings) -> Vec<String> {
        vec![
            format!("Focus session:        {} min", minutes(settings.work_duration)),
            format!("Short break:          {} min", minutes(settings.short_break_duration)),
            format!("Long break:           {} min", minutes(settings.long_break_duration)),
            format!("Long break every:     {} sessions", settings.sessions_before_long_break),
            format!("Auto-start breaks:    {}", on_off(settings.auto_start_breaks)),
            format!("Auto-start sessions:  {}", on_off(settings.auto_start_sessions)),
            format!("Sound:                {}", on_off(settings.sound_enabled)),
        ]
    }

    /// Shows the settings table.
    pub fn show_settings(settings: &TimerSettings) {
        println!("Study Timer Settings");
        println!("─────────────────────────────");
        for line in Self::settings_lines(settings) {
            println!("{}", line);
        }
    }

    /// Shows a success message after settings were saved.
    pub fn show_settings_updated(settings: &TimerSettings) {
        println!("* Timer settings updated successfully!");
        Self::show_settings(settings);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }
}

/// Whole minutes, or minutes with a seconds remainder for odd values.
fn minutes(seconds: u32) -> String {
    if seconds % 60 == 0 {
        (seconds / 60).to_string()
    } else {
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }
}

fn plural(count: u32, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 {
        one
    } else {
        many
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Foreground run loop for `study-timer run`.
//!
//! Engine callbacks fire on the tick driver's task, so they only forward
//! owned values into an mpsc channel. The loop then multiplexes three
//! sources with `tokio::select!`:
//! - engine events (snapshots and completions)
//! - line commands read from the input (usually stdin)
//! - a shutdown future (usually Ctrl-C)

use std::future::Future;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::cli::display::Display;
use crate::engine::TimerEngine;
use crate::types::{CompletionInfo, Session, SessionType};

// ============================================================================
// Events & Commands
// ============================================================================

/// Engine notifications forwarded into the run loop.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerEvent {
    Snapshot(Session),
    Completed(CompletionInfo),
}

/// A control command typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Start or resume
    Start,
    Pause,
    Stop,
    /// Finish the current session now
    Skip,
    Quit,
}

/// Parses one input line. Accepts the first letter or the full word.
pub fn parse_command(line: &str) -> Option<Control> {
    match line.trim().to_ascii_lowercase().as_str() {
        "r" | "run" | "start" | "resume" => Some(Control::Start),
        "p" | "pause" => Some(Control::Pause),
        "s" | "stop" => Some(Control::Stop),
        "n" | "next" | "skip" => Some(Control::Skip),
        "q" | "quit" | "exit" => Some(Control::Quit),
        _ => None,
    }
}

/// What happened during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Focus sessions completed during the run
    pub focus_sessions: u32,
    /// Breaks completed during the run
    pub breaks: u32,
}

impl RunSummary {
    fn record(&mut self, info: &CompletionInfo) {
        if info.completed_type == SessionType::Work {
            self.focus_sessions += 1;
        } else {
            self.breaks += 1;
        }
    }
}

// ============================================================================
// Run Loop
// ============================================================================

/// Runs `engine` in the foreground until quit, shutdown, or `cycles` focus
/// sessions have completed.
///
/// The timer is started immediately. On exit the engine is stopped and the
/// loop's subscriptions are removed.
///
/// # Errors
///
/// Returns an error if reading from `input` fails.
pub async fn run_loop<R, S>(
    engine: &TimerEngine,
    input: R,
    shutdown: S,
    cycles: Option<u32>,
) -> Result<RunSummary>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let (tx, mut rx) = mpsc::unbounded_channel();

    let snapshot_tx = tx.clone();
    let snapshots = engine.subscribe(move |session: &Session| {
        let _ = snapshot_tx.send(RunnerEvent::Snapshot(session.clone()));
    });
    let completions = engine.on_complete(move |info: &CompletionInfo| {
        let _ = tx.send(RunnerEvent::Completed(*info));
    });

    let mut lines = input.lines();
    let mut input_open = true;
    let mut summary = RunSummary::default();
    tokio::pin!(shutdown);

    Display::show_run_banner(&engine.session());
    engine.start();

    let result = loop {
        tokio::select! {
            () = &mut shutdown => {
                debug!("shutdown requested");
                break Ok(());
            }
            Some(event) = rx.recv() => match event {
                RunnerEvent::Snapshot(session) => Display::show_status_line(&session),
                RunnerEvent::Completed(info) => {
                    summary.record(&info);
                    Display::show_completion(&info, engine.settings().sound_enabled);
                    if cycles.is_some_and(|limit| summary.focus_sessions >= limit) {
                        debug!(cycles = summary.focus_sessions, "cycle limit reached");
                        break Ok(());
                    }
                }
            },
            line = lines.next_line(), if input_open => match line {
                Ok(Some(line)) => match parse_command(&line) {
                    Some(Control::Quit) => break Ok(()),
                    Some(control) => apply(engine, control),
                    None if line.trim().is_empty() => {}
                    None => warn!("unknown command: {}", line.trim()),
                },
                Ok(None) => {
                    debug!("input closed");
                    input_open = false;
                }
                Err(e) => break Err(e).context("Failed to read command"),
            },
        }
    };

    snapshots.unsubscribe();
    completions.unsubscribe();
    engine.stop();
    println!();

    result.map(|()| summary)
}

fn apply(engine: &TimerEngine, control: Control) {
    match control {
        Control::Start => engine.start(),
        Control::Pause => engine.pause(),
        Control::Stop => engine.stop(),
        Control::Skip => {
            engine.complete_session();
            return;
        }
        Control::Quit => return,
    }
    println!("\n{}", Display::control_text(engine.session().status()));
}

// ============================================================================
// Tests
// ============================================================================

//! CLI module for the study timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic
//! - `runner`: Foreground run loop driving a [`TimerEngine`](crate::engine::TimerEngine)

pub mod commands;
pub mod display;
pub mod runner;

pub use commands::{Cli, Commands, RunArgs, SetArgs, SettingsCommand};
pub use display::Display;
pub use runner::{parse_command, run_loop, Control, RunSummary, RunnerEvent};

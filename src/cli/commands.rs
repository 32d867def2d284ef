//! Command definitions for the study timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::SettingsPatch;

// ============================================================================
// CLI Structure
// ============================================================================

/// Study Timer - a Pomodoro timer for the terminal
#[derive(Parser, Debug)]
#[command(
    name = "study-timer",
    version,
    about = "Pomodoro study timer for the terminal",
    long_about = "Alternates focus sessions with short and long breaks.\n\
                  Settings are stored as JSON in the user's config directory.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the timer in the foreground
    Run(RunArgs),

    /// Show or change the saved settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Exit after this many completed focus sessions
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub cycles: Option<u32>,
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Print the saved settings
    Show {
        /// Print the raw JSON object
        #[arg(long)]
        json: bool,
    },

    /// Change one or more settings
    Set(SetArgs),

    /// Restore the default settings
    Reset,
}

// ============================================================================
// Settings Set Arguments
// ============================================================================

/// Arguments for `settings set`. Durations are given in minutes.
#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Focus session duration in minutes (1-120)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=120))]
    pub work: Option<u32>,

    /// Short break duration in minutes (1-60)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=60))]
    pub short_break: Option<u32>,

    /// Long break duration in minutes (1-120)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=120))]
    pub long_break: Option<u32>,

    /// Focus sessions before a long break (2-10)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(2..=10))]
    pub sessions_before_long_break: Option<u32>,

    /// Start breaks automatically
    #[arg(long, value_name = "BOOL")]
    pub auto_start_breaks: Option<bool>,

    /// Start focus sessions automatically after a break
    #[arg(long, value_name = "BOOL")]
    pub auto_start_sessions: Option<bool>,

    /// Ring the terminal bell on completion
    #[arg(long, value_name = "BOOL")]
    pub sound: Option<bool>,
}

impl SetArgs {
    /// Converts the arguments into a settings patch (minutes to seconds).
    pub fn to_patch(&self) -> SettingsPatch {
        SettingsPatch {
            work_duration: self.work.map(minutes_to_seconds),
            short_break_duration: self.short_break.map(minutes_to_seconds),
            long_break_duration: self.long_break.map(minutes_to_seconds),
            sessions_before_long_break: self.sessions_before_long_break,
            auto_start_breaks: self.auto_start_breaks,
            auto_start_sessions: self.auto_start_sessions,
            sound_enabled: self.sound,
        }
    }
}

fn minutes_to_seconds(minutes: u32) -> u32 {
    minutes.saturating_mul(60)
}

// ============================================================================
// Tests
// ============================================================================

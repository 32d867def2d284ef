//! Study Timer CLI - a Pomodoro timer for the terminal
//!
//! Alternates focus sessions with breaks:
//! - 25 minutes of focused work
//! - 5 minutes of short break
//! - 15 minutes of long break after every 4 focus sessions

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use tokio::io::BufReader;

use study_timer::cli::{run_loop, Cli, Commands, Display, SettingsCommand};
use study_timer::{FileStore, SettingsPatch, TimerEngine, TimerSettings, TokioScheduler};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let Cli {
        command,
        verbose,
        data_dir,
    } = cli;

    if verbose {
        tracing::info!("Verbose mode enabled");
    }

    match command {
        Some(Commands::Run(args)) => {
            let engine = open_engine(data_dir)?;
            let input = BufReader::new(tokio::io::stdin());
            let summary = run_loop(&engine, input, ctrl_c(), args.cycles).await?;
            engine.shutdown();
            Display::show_run_summary(&summary);
        }
        Some(Commands::Settings { action }) => {
            let engine = open_engine(data_dir)?;
            execute_settings(&engine, action)?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Executes a `settings` subcommand.
fn execute_settings(engine: &TimerEngine, action: SettingsCommand) -> Result<()> {
    match action {
        SettingsCommand::Show { json } => {
            let settings = engine.settings();
            if json {
                let text = serde_json::to_string_pretty(&settings)
                    .context("Failed to serialize settings")?;
                println!("{}", text);
            } else {
                Display::show_settings(&settings);
            }
        }
        SettingsCommand::Set(args) => {
            let patch = args.to_patch();
            if patch.is_empty() {
                bail!("Nothing to change; see `study-timer settings set --help`");
            }

            let mut candidate = engine.settings();
            candidate.apply(&patch);
            candidate.validate().context("Invalid settings")?;

            let updated = engine.update_settings(&patch);
            Display::show_settings_updated(&updated);
        }
        SettingsCommand::Reset => {
            let updated = engine.update_settings(&SettingsPatch::from(TimerSettings::default()));
            Display::show_settings_updated(&updated);
        }
    }
    Ok(())
}

/// Builds an engine backed by the settings file in `data_dir`.
fn open_engine(data_dir: Option<PathBuf>) -> Result<TimerEngine> {
    let store = match data_dir {
        Some(dir) => FileStore::new(dir),
        None => FileStore::open_default().context("Failed to locate the data directory")?,
    };
    tracing::debug!(dir = %store.dir().display(), "using data directory");

    let scheduler = TokioScheduler::new().context("Failed to start the tick driver")?;
    Ok(TimerEngine::new(Arc::new(scheduler), Box::new(store)))
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================

//! Timer engine for the study timer.
//!
//! This module contains the core session logic:
//! - `duration`: Duration policy (session type to seconds)
//! - `state`: Pure session state machine
//! - `timer`: Engine handle with tick driver, settings and observers
//! - `error`: Engine and settings validation errors

pub mod duration;
pub mod error;
pub mod state;
pub mod timer;

pub use duration::{duration_for, duration_for_name, effective_duration, MIN_DURATION_SECS};
pub use error::{SettingsError, TimerError};
pub use state::{next_session_type, SessionMachine, TickOutcome, Transition};
pub use timer::TimerEngine;

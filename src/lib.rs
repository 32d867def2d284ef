//! Study Timer Library
//!
//! A Pomodoro session engine that alternates focus sessions with short and
//! long breaks. It includes:
//! - Session types, settings and snapshots (`types`)
//! - Duration policy, state machine and the timer engine (`engine`)
//! - Tick drivers: a tokio interval task and a manual fake clock (`scheduler`)
//! - Key-value persistence for settings (`storage`)
//! - Observer registry for change and completion notifications (`observer`)
//! - Terminal front-end: commands, display and run loop (`cli`)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use study_timer::{ManualScheduler, MemoryStore, SessionType, TimerEngine};
//!
//! let clock = Arc::new(ManualScheduler::new());
//! let engine = TimerEngine::new(clock.clone(), Box::new(MemoryStore::new()));
//!
//! engine.start();
//! clock.advance(1500);
//!
//! let session = engine.session();
//! assert_eq!(session.session_type, SessionType::ShortBreak);
//! assert_eq!(session.session_count, 1);
//! ```

pub mod cli;
pub mod engine;
pub mod observer;
pub mod scheduler;
pub mod storage;
pub mod types;

// Re-export commonly used types for convenience
pub use engine::{SettingsError, TimerEngine, TimerError};
pub use observer::{ObserverRegistry, Subscription};
pub use scheduler::{ManualScheduler, Scheduler, TickHandle, TokioScheduler, TICK_PERIOD};
pub use storage::{FileStore, KeyValueStore, MemoryStore, SettingsStore, StorageError, SETTINGS_KEY};
pub use types::{
    CompletionInfo, Session, SessionStatus, SessionType, SettingsPatch, TimerSettings,
};

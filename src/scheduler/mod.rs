//! Tick scheduling for the timer engine.
//!
//! The engine never touches wall-clock time directly. It asks a
//! [`Scheduler`] to arm a periodic callback and keeps the returned
//! [`TickHandle`] until the countdown stops.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   arm(period, callback)   ┌──────────────────┐
//! │   TimerEngine    │ ─────────────────────────▶ │    Scheduler     │
//! │                  │ ◀───────── tick() ──────── │                  │
//! └──────────────────┘        TickHandle          └────────┬─────────┘
//!                                                          │
//!                                   ┌──────────────────────┴──────┐
//!                                   ▼                             ▼
//!                          ┌────────────────┐           ┌──────────────────┐
//!                          │ TokioScheduler │           │ ManualScheduler  │
//!                          │ (interval task)│           │ (fake clock)     │
//!                          └────────────────┘           └──────────────────┘
//! ```

mod manual;
mod tokio_driver;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub use manual::ManualScheduler;
pub use tokio_driver::TokioScheduler;

/// Period between ticks delivered to the engine.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Callback invoked once per elapsed period.
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

/// A source of periodic ticks.
pub trait Scheduler: Send + Sync {
    /// Starts calling `callback` every `period` until the handle is cancelled.
    ///
    /// The first call happens one full period after arming.
    fn arm(&self, period: Duration, callback: TickCallback) -> TickHandle;
}

/// Cancels an armed callback. Cancellation also happens on drop.
///
/// Schedulers must check [`is_armed`](Self::is_armed) (through the shared
/// flag) before every delivery, which makes `cancel` safe to call from inside
/// the callback itself.
pub struct TickHandle {
    armed: Arc<AtomicBool>,
    on_cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TickHandle {
    /// Creates a handle over the shared `armed` flag.
    pub fn new(armed: Arc<AtomicBool>) -> Self {
        Self {
            armed,
            on_cancel: None,
        }
    }

    /// Runs `hook` once when the handle is cancelled, e.g. to abort a task.
    pub fn on_cancel<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_cancel = Some(Box::new(hook));
        self
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Stops further deliveries. Calling it again does nothing.
    pub fn cancel(&mut self) {
        self.armed.store(false, Ordering::SeqCst);
        if let Some(hook) = self.on_cancel.take() {
            hook();
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TickHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickHandle")
            .field("armed", &self.is_armed())
            .finish()
    }
}

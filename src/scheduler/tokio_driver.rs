//! Tick driver backed by a tokio interval task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::{Scheduler, TickCallback, TickHandle};
use crate::engine::TimerError;

/// Spawns one interval task per armed callback on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    /// Creates a scheduler on the runtime the caller is running in.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::SchedulerUnavailable`] outside a tokio runtime.
    pub fn new() -> Result<Self, TimerError> {
        Handle::try_current()
            .map(Self::with_handle)
            .map_err(|e| TimerError::SchedulerUnavailable(e.to_string()))
    }

    /// Creates a scheduler that spawns onto `runtime`.
    pub fn with_handle(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl Scheduler for TokioScheduler {
    fn arm(&self, period: Duration, callback: TickCallback) -> TickHandle {
        // tokio intervals panic on a zero period
        let period = period.max(Duration::from_millis(1));
        let armed = Arc::new(AtomicBool::new(true));
        let task_armed = Arc::clone(&armed);

        let task = self.runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if !task_armed.load(Ordering::SeqCst) {
                    break;
                }
                callback();
            }
            tracing::trace!("tick driver exited");
        });

        let abort = task.abort_handle();
        TickHandle::new(armed).on_cancel(move || abort.abort())
    }
}

//! Fake clock for deterministic tests.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{Scheduler, TickCallback, TickHandle};

struct Armed {
    flag: Arc<AtomicBool>,
    callback: TickCallback,
}

/// A scheduler driven by explicit [`advance`](Self::advance) calls.
///
/// Every call to `advance(n)` delivers `n` rounds; each round calls every
/// armed callback once, whatever period it was armed with. Callbacks armed
/// during a round are first called in the next round.
#[derive(Default)]
pub struct ManualScheduler {
    armed: Mutex<Vec<Armed>>,
    arm_calls: AtomicUsize,
    rounds: AtomicU64,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Armed>> {
        self.armed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers `rounds` ticks to every armed callback.
    pub fn advance(&self, rounds: u32) {
        for _ in 0..rounds {
            self.fire_round();
        }
    }

    fn fire_round(&self) {
        let round: Vec<(Arc<AtomicBool>, TickCallback)> = {
            let mut armed = self.lock();
            armed.retain(|entry| entry.flag.load(Ordering::SeqCst));
            armed
                .iter()
                .map(|entry| (Arc::clone(&entry.flag), Arc::clone(&entry.callback)))
                .collect()
        };

        for (flag, callback) in round {
            if flag.load(Ordering::SeqCst) {
                callback();
            }
        }
        self.rounds.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of callbacks that are still armed.
    pub fn armed_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|entry| entry.flag.load(Ordering::SeqCst))
            .count()
    }

    /// Total number of `arm` calls so far.
    pub fn arm_calls(&self) -> usize {
        self.arm_calls.load(Ordering::SeqCst)
    }

    /// Total number of rounds delivered so far.
    pub fn rounds(&self) -> u64 {
        self.rounds.load(Ordering::SeqCst)
    }
}

impl Scheduler for ManualScheduler {
    fn arm(&self, _period: Duration, callback: TickCallback) -> TickHandle {
        let flag = Arc::new(AtomicBool::new(true));
        self.lock().push(Armed {
            flag: Arc::clone(&flag),
            callback,
        });
        self.arm_calls.fetch_add(1, Ordering::SeqCst);
        TickHandle::new(flag)
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("armed", &self.armed_count())
            .field("arm_calls", &self.arm_calls())
            .field("rounds", &self.rounds())
            .finish()
    }
}

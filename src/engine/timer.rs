//! Timer engine for the study timer.
//!
//! This module ties the pieces together:
//! - [`SessionMachine`] for the transition rules
//! - [`SettingsStore`] for persisted settings
//! - a [`Scheduler`] that delivers one tick per second while running
//! - two observer registries, one for session snapshots and one for
//!   completion descriptors
//!
//! Every public method takes the internal lock, mutates, releases it, and
//! only then notifies observers. Observers may therefore call back into the
//! engine (e.g. pause from inside a completion callback).

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info};

use super::duration::duration_for;
use super::state::{SessionMachine, TickOutcome};
use crate::observer::{ObserverRegistry, Subscription};
use crate::scheduler::{Scheduler, TickCallback, TickHandle, TICK_PERIOD};
use crate::storage::{KeyValueStore, SettingsStore};
use crate::types::{CompletionInfo, Session, SessionType, SettingsPatch, TimerSettings};

// ============================================================================
// Shared state
// ============================================================================

struct EngineCore {
    machine: SessionMachine,
    settings: SettingsStore,
    driver: Option<TickHandle>,
}

impl EngineCore {
    fn cancel_driver(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.cancel();
        }
    }
}

struct Shared {
    core: Mutex<EngineCore>,
    snapshots: ObserverRegistry<Session>,
    completions: ObserverRegistry<CompletionInfo>,
    scheduler: Arc<dyn Scheduler>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EngineCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Arms the tick driver unless one is already live.
fn ensure_driver(shared: &Arc<Shared>, core: &mut EngineCore) {
    if core.driver.as_ref().is_some_and(TickHandle::is_armed) {
        return;
    }

    let engine: Weak<Shared> = Arc::downgrade(shared);
    let callback: TickCallback = Arc::new(move || {
        if let Some(shared) = engine.upgrade() {
            TimerEngine { shared }.tick();
        }
    });
    core.driver = Some(shared.scheduler.arm(TICK_PERIOD, callback));
    debug!("tick driver armed");
}

/// Runs the completion transition with the lock held.
fn complete_locked(shared: &Arc<Shared>, core: &mut EngineCore) -> CompletionInfo {
    core.cancel_driver();

    let transition = core.machine.complete(core.settings.current());
    if core.machine.session().is_ticking() {
        ensure_driver(shared, core);
    }

    let completion = transition.completion;
    info!(
        completed = %completion.completed_type,
        next = %completion.next_type,
        sessions = completion.session_count,
        auto_started = transition.auto_started,
        "session completed"
    );
    completion
}

// ============================================================================
// TimerEngine
// ============================================================================

/// The study timer: one live session, driven by an injected scheduler.
///
/// `TimerEngine` is a cheap handle; clones share the same session. The tick
/// driver only holds a weak reference, so dropping the last handle stops the
/// countdown.
#[derive(Clone)]
pub struct TimerEngine {
    shared: Arc<Shared>,
}

impl TimerEngine {
    /// Creates an engine with settings loaded from `store`.
    ///
    /// The initial session is an idle work session sized from the loaded
    /// settings.
    pub fn new(scheduler: Arc<dyn Scheduler>, store: Box<dyn KeyValueStore>) -> Self {
        let settings = SettingsStore::open(store);
        let machine = SessionMachine::new(settings.current());

        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(EngineCore {
                    machine,
                    settings,
                    driver: None,
                }),
                snapshots: ObserverRegistry::new(),
                completions: ObserverRegistry::new(),
                scheduler,
            }),
        }
    }

    /// Starts an idle session or resumes a paused one.
    ///
    /// Does nothing (and notifies no one) if the session is already running.
    pub fn start(&self) {
        let snapshot = {
            let mut core = self.shared.lock();
            if !core.machine.start() {
                debug!("start ignored: already running");
                return;
            }
            ensure_driver(&self.shared, &mut core);
            core.machine.snapshot()
        };

        debug!(kind = %snapshot.session_type, remaining = snapshot.time_remaining, "started");
        self.shared.snapshots.notify_all(&snapshot);
    }

    /// Pauses a running session. Does nothing if idle or already paused.
    pub fn pause(&self) {
        let snapshot = {
            let mut core = self.shared.lock();
            if !core.machine.pause() {
                debug!("pause ignored: not running");
                return;
            }
            core.cancel_driver();
            core.machine.snapshot()
        };

        debug!(remaining = snapshot.time_remaining, "paused");
        self.shared.snapshots.notify_all(&snapshot);
    }

    /// Returns to idle with a full countdown for the current session type.
    ///
    /// Always notifies, even if the session was already idle.
    pub fn stop(&self) {
        let snapshot = {
            let mut core = self.shared.lock();
            core.cancel_driver();
            let EngineCore {
                machine, settings, ..
            } = &mut *core;
            machine.stop(settings.current());
            machine.snapshot()
        };

        debug!(kind = %snapshot.session_type, "stopped");
        self.shared.snapshots.notify_all(&snapshot);
    }

    /// Delivers one elapsed second.
    ///
    /// Returns the completion descriptor if this tick finished the session.
    /// Ticks while idle or paused are ignored.
    pub fn tick(&self) -> Option<CompletionInfo> {
        let (snapshot, completion) = {
            let mut core = self.shared.lock();
            match core.machine.tick() {
                TickOutcome::Ignored => return None,
                TickOutcome::Counted => (core.machine.snapshot(), None),
                TickOutcome::Finished => {
                    let completion = complete_locked(&self.shared, &mut core);
                    (core.machine.snapshot(), Some(completion))
                }
            }
        };

        self.shared.snapshots.notify_all(&snapshot);
        if let Some(completion) = &completion {
            self.shared.completions.notify_all(completion);
        }
        completion
    }

    /// Finishes the current session immediately, from any state.
    pub fn complete_session(&self) -> CompletionInfo {
        let (snapshot, completion) = {
            let mut core = self.shared.lock();
            let completion = complete_locked(&self.shared, &mut core);
            (core.machine.snapshot(), completion)
        };

        self.shared.snapshots.notify_all(&snapshot);
        self.shared.completions.notify_all(&completion);
        completion
    }

    /// Merges `patch` into the settings and persists them.
    ///
    /// An idle session is resized to the new durations; a running or paused
    /// countdown keeps its current leg. Always notifies.
    pub fn update_settings(&self, patch: &SettingsPatch) -> TimerSettings {
        let (snapshot, updated) = {
            let mut core = self.shared.lock();
            let updated = core.settings.update(patch);
            if !core.machine.session().is_running {
                core.machine.reset(&updated);
            }
            (core.machine.snapshot(), updated)
        };

        self.shared.snapshots.notify_all(&snapshot);
        updated
    }

    /// Returns a snapshot of the live session.
    pub fn session(&self) -> Session {
        self.shared.lock().machine.snapshot()
    }

    /// Returns the current settings.
    pub fn settings(&self) -> TimerSettings {
        self.shared.lock().settings.current().clone()
    }

    /// Configured duration of `session_type` under the current settings.
    pub fn duration_for(&self, session_type: SessionType) -> u32 {
        duration_for(session_type, self.shared.lock().settings.current())
    }

    /// Registers a callback for every state change.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        self.shared.snapshots.subscribe(callback)
    }

    /// Registers a callback for every completed session.
    pub fn on_complete<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&CompletionInfo) + Send + Sync + 'static,
    {
        self.shared.completions.subscribe(callback)
    }

    /// Returns true while a tick driver is armed.
    pub fn is_driving(&self) -> bool {
        self.shared
            .lock()
            .driver
            .as_ref()
            .is_some_and(TickHandle::is_armed)
    }

    /// Cancels the driver and drops every subscriber.
    ///
    /// The session itself is left as is.
    pub fn shutdown(&self) {
        self.shared.lock().cancel_driver();
        self.shared.snapshots.clear();
        self.shared.completions.clear();
        debug!("engine shut down");
    }
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.shared.lock();
        f.debug_struct("TimerEngine")
            .field("session", core.machine.session())
            .field("settings", core.settings.current())
            .field("driving", &core.driver.is_some())
            .field("subscribers", &self.shared.snapshots.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use crate::storage::{MemoryStore, SETTINGS_KEY};
    use crate::types::SessionStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn create_engine() -> (TimerEngine, Arc<ManualScheduler>) {
        create_engine_with_settings(&TimerSettings::default())
    }

    fn create_engine_with_settings(settings: &TimerSettings) -> (TimerEngine, Arc<ManualScheduler>) {
        let scheduler = Arc::new(ManualScheduler::new());
        let store = MemoryStore::with_value(SETTINGS_KEY, &serde_json::to_string(settings).unwrap());
        let engine = TimerEngine::new(scheduler.clone(), Box::new(store));
        (engine, scheduler)
    }

    fn record_snapshots(engine: &TimerEngine) -> Arc<Mutex<Vec<Session>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = engine.subscribe(move |session: &Session| {
            sink.lock().unwrap().push(session.clone());
        });
        seen
    }

    // ------------------------------------------------------------------------
    // Lifecycle Tests
    // ------------------------------------------------------------------------

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn test_new_engine() {
            let (engine, scheduler) = create_engine();
            let session = engine.session();

            assert_eq!(session.session_type, SessionType::Work);
            assert_eq!(session.time_remaining, 1500);
            assert_eq!(session.session_count, 0);
            assert_eq!(session.status(), SessionStatus::Idle);
            assert!(!engine.is_driving());
            assert_eq!(scheduler.arm_calls(), 0);
        }

        #[test]
        fn test_new_engine_uses_loaded_work_duration() {
            let (engine, _) =
                create_engine_with_settings(&TimerSettings::default().with_work_duration(600));
            assert_eq!(engine.session().total_time, 600);
            assert_eq!(engine.duration_for(SessionType::Work), 600);
        }

        #[test]
        fn test_start_arms_driver_and_notifies() {
            let (engine, scheduler) = create_engine();
            let seen = record_snapshots(&engine);

            engine.start();

            assert!(engine.is_driving());
            assert_eq!(scheduler.armed_count(), 1);
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].status(), SessionStatus::Running);
        }

        #[test]
        fn test_start_twice_keeps_single_driver() {
            let (engine, scheduler) = create_engine();
            let seen = record_snapshots(&engine);

            engine.start();
            engine.start();

            assert_eq!(scheduler.arm_calls(), 1);
            assert_eq!(seen.lock().unwrap().len(), 1);
        }

        #[test]
        fn test_pause_disarms_and_resume_rearms() {
            let (engine, scheduler) = create_engine();
            engine.start();
            scheduler.advance(10);

            engine.pause();
            assert!(!engine.is_driving());
            scheduler.advance(10);
            assert_eq!(engine.session().time_remaining, 1490);

            engine.start();
            assert!(engine.is_driving());
            scheduler.advance(5);
            assert_eq!(engine.session().time_remaining, 1485);
            assert_eq!(scheduler.armed_count(), 1);
        }

        #[test]
        fn test_pause_when_idle_does_not_notify() {
            let (engine, _) = create_engine();
            let seen = record_snapshots(&engine);

            engine.pause();

            assert!(seen.lock().unwrap().is_empty());
        }

        #[test]
        fn test_stop_always_notifies() {
            let (engine, scheduler) = create_engine();
            let seen = record_snapshots(&engine);

            engine.stop();
            engine.start();
            scheduler.advance(3);
            engine.stop();

            let seen = seen.lock().unwrap();
            let last = seen.last().unwrap();
            assert_eq!(last.status(), SessionStatus::Idle);
            assert_eq!(last.time_remaining, 1500);
            assert!(seen[0].is_idle());
            assert!(!engine.is_driving());
        }

        #[test]
        fn test_shutdown_clears_subscribers_and_driver() {
            let (engine, scheduler) = create_engine();
            let seen = record_snapshots(&engine);
            engine.start();

            engine.shutdown();
            scheduler.advance(5);

            assert_eq!(seen.lock().unwrap().len(), 1);
            assert!(!engine.is_driving());
        }

        #[test]
        fn test_dropping_engine_stops_driver() {
            let (engine, scheduler) = create_engine();
            engine.start();
            drop(engine);

            assert_eq!(scheduler.armed_count(), 0);
            scheduler.advance(3);
        }
    }

    // ------------------------------------------------------------------------
    // Tick & Completion Tests
    // ------------------------------------------------------------------------

    mod completion_tests {
        use super::*;

        #[test]
        fn test_driver_ticks_count_down() {
            let (engine, scheduler) = create_engine();
            let seen = record_snapshots(&engine);
            engine.start();

            scheduler.advance(3);

            assert_eq!(engine.session().time_remaining, 1497);
            let remaining: Vec<u32> = seen.lock().unwrap().iter().map(|s| s.time_remaining).collect();
            assert_eq!(remaining, vec![1500, 1499, 1498, 1497]);
        }

        #[test]
        fn test_manual_tick_while_idle_is_ignored() {
            let (engine, _) = create_engine();
            assert_eq!(engine.tick(), None);
            assert_eq!(engine.session().time_remaining, 1500);
        }

        #[test]
        fn test_completion_returns_descriptor_and_notifies_once() {
            let settings = TimerSettings::default().with_work_duration(2);
            let (engine, scheduler) = create_engine_with_settings(&settings);
            let seen = record_snapshots(&engine);
            let completions = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&completions);
            let _sub = engine.on_complete(move |info: &CompletionInfo| {
                sink.lock().unwrap().push(*info);
            });

            engine.start();
            scheduler.advance(2);

            let completions = completions.lock().unwrap();
            assert_eq!(
                completions.as_slice(),
                &[CompletionInfo {
                    completed_type: SessionType::Work,
                    next_type: SessionType::ShortBreak,
                    session_count: 1,
                }]
            );

            // start, one counted tick, one settled completion
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 3);
            let settled = seen.last().unwrap();
            assert_eq!(settled.session_type, SessionType::ShortBreak);
            assert_eq!(settled.time_remaining, 300);
            assert!(settled.is_idle());
            assert!(!engine.is_driving());
        }

        #[test]
        fn test_auto_start_break_rearms_driver() {
            let settings = TimerSettings::default()
                .with_work_duration(2)
                .with_short_break_duration(3)
                .with_auto_start(true, false);
            let (engine, scheduler) = create_engine_with_settings(&settings);

            engine.start();
            scheduler.advance(2);

            let session = engine.session();
            assert_eq!(session.session_type, SessionType::ShortBreak);
            assert!(session.is_ticking());
            assert!(engine.is_driving());

            scheduler.advance(3);
            let session = engine.session();
            assert_eq!(session.session_type, SessionType::Work);
            assert!(session.is_idle());
            assert_eq!(scheduler.armed_count(), 0);
        }

        #[test]
        fn test_complete_session_from_idle() {
            let (engine, _) = create_engine();
            let count = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&count);
            let _sub = engine.on_complete(move |_: &CompletionInfo| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

            let info = engine.complete_session();

            assert_eq!(info.completed_type, SessionType::Work);
            assert_eq!(info.session_count, 1);
            assert_eq!(count.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn test_observer_can_pause_inside_notification() {
            let settings = TimerSettings::default()
                .with_work_duration(1)
                .with_auto_start(true, true);
            let (engine, scheduler) = create_engine_with_settings(&settings);

            let inner = engine.clone();
            let _sub = engine.on_complete(move |_: &CompletionInfo| inner.pause());

            engine.start();
            scheduler.advance(1);

            let session = engine.session();
            assert_eq!(session.session_type, SessionType::ShortBreak);
            assert_eq!(session.status(), SessionStatus::Paused);
            assert!(!engine.is_driving());
        }
    }

    // ------------------------------------------------------------------------
    // Settings Tests
    // ------------------------------------------------------------------------

    mod settings_tests {
        use super::*;

        #[test]
        fn test_update_while_idle_resets_session() {
            let (engine, _) = create_engine();
            let seen = record_snapshots(&engine);

            let updated = engine.update_settings(&SettingsPatch {
                work_duration: Some(1800),
                ..Default::default()
            });

            assert_eq!(updated.work_duration, 1800);
            assert_eq!(engine.settings().work_duration, 1800);
            assert_eq!(engine.session().total_time, 1800);
            assert_eq!(engine.session().time_remaining, 1800);
            assert_eq!(seen.lock().unwrap().len(), 1);
        }

        #[test]
        fn test_update_while_running_keeps_countdown() {
            let (engine, scheduler) = create_engine();
            engine.start();
            scheduler.advance(100);

            engine.update_settings(&SettingsPatch {
                work_duration: Some(600),
                ..Default::default()
            });

            let session = engine.session();
            assert_eq!(session.time_remaining, 1400);
            assert_eq!(session.total_time, 1500);

            engine.stop();
            assert_eq!(engine.session().time_remaining, 600);
        }

        #[test]
        fn test_update_while_paused_keeps_countdown() {
            let (engine, scheduler) = create_engine();
            engine.start();
            scheduler.advance(10);
            engine.pause();

            engine.update_settings(&SettingsPatch {
                work_duration: Some(600),
                ..Default::default()
            });

            assert_eq!(engine.session().time_remaining, 1490);
        }
    }
}

//! Integration tests for the timer engine.
//!
//! These tests drive a full engine (state machine, settings store, observers)
//! with the manual fake clock:
//! - Complete work session and break chaining
//! - Long break after N work sessions
//! - Auto-start chaining
//! - Live settings changes
//! - Re-entrant observers
//! - Settings persistence across engines

use std::sync::{Arc, Mutex};

use study_timer::storage::parse_settings;
use study_timer::{
    CompletionInfo, FileStore, KeyValueStore, ManualScheduler, MemoryStore, Session,
    SessionStatus, SessionType, SettingsPatch, TimerEngine, TimerSettings, SETTINGS_KEY,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Creates an engine on a fresh fake clock and an empty memory store.
fn create_engine() -> (TimerEngine, Arc<ManualScheduler>, Arc<MemoryStore>) {
    let clock = Arc::new(ManualScheduler::new());
    let store = Arc::new(MemoryStore::new());
    let engine = TimerEngine::new(clock.clone(), Box::new(Arc::clone(&store)));
    (engine, clock, store)
}

/// Creates an engine whose store already holds `settings`.
fn create_engine_with_settings(settings: &TimerSettings) -> (TimerEngine, Arc<ManualScheduler>) {
    let clock = Arc::new(ManualScheduler::new());
    let blob = serde_json::to_string(settings).unwrap();
    let store = MemoryStore::with_value(SETTINGS_KEY, &blob);
    let engine = TimerEngine::new(clock.clone(), Box::new(store));
    (engine, clock)
}

/// Collects every completion descriptor.
fn record_completions(engine: &TimerEngine) -> Arc<Mutex<Vec<CompletionInfo>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = engine.on_complete(move |info: &CompletionInfo| {
        sink.lock().unwrap().push(*info);
    });
    seen
}

/// Collects every snapshot.
fn record_snapshots(engine: &TimerEngine) -> Arc<Mutex<Vec<Session>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = engine.subscribe(move |session: &Session| {
        sink.lock().unwrap().push(session.clone());
    });
    seen
}

// ============================================================================
// Full Cycle
// ============================================================================

#[test]
fn test_default_work_session_completes_after_1500_ticks() {
    let (engine, clock, _) = create_engine();
    let completions = record_completions(&engine);

    engine.start();
    clock.advance(1499);
    assert_eq!(engine.session().time_remaining, 1);
    assert!(completions.lock().unwrap().is_empty());

    clock.advance(1);

    assert_eq!(
        completions.lock().unwrap().as_slice(),
        &[CompletionInfo {
            completed_type: SessionType::Work,
            next_type: SessionType::ShortBreak,
            session_count: 1,
        }]
    );
    let session = engine.session();
    assert_eq!(session.session_type, SessionType::ShortBreak);
    assert_eq!(session.status(), SessionStatus::Idle);
    assert_eq!(session.time_remaining, 300);
    assert_eq!(session.total_time, 300);
    assert_eq!(session.session_count, 1);
}

#[test]
fn test_fourth_work_session_leads_to_long_break() {
    let (engine, clock, _) = create_engine();
    let completions = record_completions(&engine);

    for _ in 0..3 {
        engine.start();
        clock.advance(1500);
        engine.start();
        clock.advance(300);
    }
    engine.start();
    clock.advance(1500);

    let completions = completions.lock().unwrap();
    assert_eq!(completions.len(), 7);
    assert_eq!(
        completions.last(),
        Some(&CompletionInfo {
            completed_type: SessionType::Work,
            next_type: SessionType::LongBreak,
            session_count: 4,
        })
    );
    let session = engine.session();
    assert_eq!(session.session_type, SessionType::LongBreak);
    assert_eq!(session.time_remaining, 900);
}

#[test]
fn test_session_count_only_counts_work() {
    let (engine, clock, _) = create_engine();

    engine.start();
    clock.advance(1500);
    engine.start();
    clock.advance(300);

    let session = engine.session();
    assert_eq!(session.session_type, SessionType::Work);
    assert_eq!(session.session_count, 1);
}

#[test]
fn test_ticks_while_idle_change_nothing() {
    let (engine, clock, _) = create_engine();
    let snapshots = record_snapshots(&engine);

    clock.advance(100);

    assert_eq!(engine.session().time_remaining, 1500);
    assert!(snapshots.lock().unwrap().is_empty());
}

// ============================================================================
// Auto-start Chaining
// ============================================================================

#[test]
fn test_auto_start_runs_unattended() {
    let settings = TimerSettings::default()
        .with_work_duration(10)
        .with_short_break_duration(5)
        .with_long_break_duration(7)
        .with_sessions_before_long_break(2)
        .with_auto_start(true, true);
    let (engine, clock) = create_engine_with_settings(&settings);
    let completions = record_completions(&engine);

    engine.start();
    // work, short, work, long
    clock.advance(10 + 5 + 10 + 7);

    let types: Vec<(SessionType, SessionType)> = completions
        .lock()
        .unwrap()
        .iter()
        .map(|c| (c.completed_type, c.next_type))
        .collect();
    assert_eq!(
        types,
        vec![
            (SessionType::Work, SessionType::ShortBreak),
            (SessionType::ShortBreak, SessionType::Work),
            (SessionType::Work, SessionType::LongBreak),
            (SessionType::LongBreak, SessionType::Work),
        ]
    );
    let session = engine.session();
    assert_eq!(session.session_type, SessionType::Work);
    assert_eq!(session.status(), SessionStatus::Running);
    assert_eq!(session.time_remaining, 10);
    assert_eq!(clock.armed_count(), 1);
}

#[test]
fn test_completion_notifies_settled_state_once() {
    let settings = TimerSettings::default()
        .with_work_duration(1)
        .with_auto_start(true, false);
    let (engine, clock) = create_engine_with_settings(&settings);
    let snapshots = record_snapshots(&engine);

    engine.start();
    clock.advance(1);

    let snapshots = snapshots.lock().unwrap();
    assert_eq!(snapshots.len(), 2);
    let settled = &snapshots[1];
    assert_eq!(settled.session_type, SessionType::ShortBreak);
    assert_eq!(settled.status(), SessionStatus::Running);
    assert_eq!(settled.time_remaining, 300);
}

// ============================================================================
// Control Operations
// ============================================================================

#[test]
fn test_stop_from_every_state() {
    let (engine, clock, _) = create_engine();

    engine.stop();
    assert_eq!(engine.session().status(), SessionStatus::Idle);

    engine.start();
    clock.advance(42);
    engine.stop();
    assert_eq!(engine.session().time_remaining, 1500);

    engine.start();
    clock.advance(42);
    engine.pause();
    engine.stop();
    assert_eq!(engine.session().status(), SessionStatus::Idle);
    assert_eq!(engine.session().time_remaining, 1500);
    assert!(!engine.is_driving());
}

#[test]
fn test_paused_session_ignores_ticks() {
    let (engine, clock, _) = create_engine();
    engine.start();
    clock.advance(5);
    engine.pause();

    clock.advance(500);
    assert_eq!(engine.session().time_remaining, 1495);

    engine.start();
    clock.advance(1495);
    assert_eq!(engine.session().session_type, SessionType::ShortBreak);
}

#[test]
fn test_observer_pauses_inside_notification() {
    let settings = TimerSettings::default()
        .with_work_duration(3)
        .with_auto_start(true, true);
    let (engine, clock) = create_engine_with_settings(&settings);

    let handle = engine.clone();
    let _subscription = engine.subscribe(move |session: &Session| {
        if session.session_type == SessionType::ShortBreak && session.is_ticking() {
            handle.pause();
        }
    });

    engine.start();
    clock.advance(3);
    clock.advance(100);

    let session = engine.session();
    assert_eq!(session.session_type, SessionType::ShortBreak);
    assert_eq!(session.status(), SessionStatus::Paused);
    assert_eq!(session.time_remaining, 300);
}

#[test]
fn test_unsubscribed_observer_not_called() {
    let (engine, clock, _) = create_engine();
    let seen = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&seen);
    let subscription = engine.subscribe(move |_: &Session| {
        *sink.lock().unwrap() += 1;
    });

    engine.start();
    assert!(subscription.unsubscribe());
    clock.advance(10);

    assert_eq!(*seen.lock().unwrap(), 1);
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn test_update_settings_idle_resizes_session() {
    let (engine, _, store) = create_engine();

    let updated = engine.update_settings(&SettingsPatch {
        work_duration: Some(45 * 60),
        ..Default::default()
    });

    assert_eq!(updated.work_duration, 2700);
    assert_eq!(engine.session().time_remaining, 2700);
    let saved = store.get(SETTINGS_KEY).unwrap();
    assert_eq!(parse_settings(&saved).work_duration, 2700);
}

#[test]
fn test_update_settings_running_applies_next_leg() {
    let (engine, clock, _) = create_engine();
    engine.start();
    clock.advance(60);

    engine.update_settings(&SettingsPatch {
        work_duration: Some(600),
        short_break_duration: Some(120),
        ..Default::default()
    });
    assert_eq!(engine.session().time_remaining, 1440);

    clock.advance(1440);
    let session = engine.session();
    assert_eq!(session.session_type, SessionType::ShortBreak);
    assert_eq!(session.time_remaining, 120);
}

#[test]
fn test_failed_save_keeps_update_in_memory() {
    let (engine, _, store) = create_engine();
    store.set_fail_writes(true);

    let updated = engine.update_settings(&SettingsPatch {
        sound_enabled: Some(false),
        ..Default::default()
    });

    assert!(!updated.sound_enabled);
    assert!(!engine.settings().sound_enabled);
    assert!(store.get(SETTINGS_KEY).is_none());
}

#[test]
fn test_malformed_blob_loads_defaults() {
    let clock = Arc::new(ManualScheduler::new());
    let store = MemoryStore::with_value(SETTINGS_KEY, "{\"workDuration\": ");
    let engine = TimerEngine::new(clock, Box::new(store));

    assert_eq!(engine.settings(), TimerSettings::default());
    assert_eq!(engine.session().total_time, 1500);
}

#[test]
fn test_partial_blob_merges_over_defaults() {
    let clock = Arc::new(ManualScheduler::new());
    let store = MemoryStore::with_value(SETTINGS_KEY, r#"{"workDuration": 600}"#);
    let engine = TimerEngine::new(clock, Box::new(store));

    assert_eq!(engine.settings(), TimerSettings::default().with_work_duration(600));
    assert_eq!(engine.session().time_remaining, 600);
}

#[test]
fn test_zero_duration_blob_clamped() {
    let clock = Arc::new(ManualScheduler::new());
    let store = MemoryStore::with_value(
        SETTINGS_KEY,
        r#"{"workDuration": 0, "sessionsBeforeLongBreak": 0}"#,
    );
    let engine = TimerEngine::new(clock.clone(), Box::new(store));
    let completions = record_completions(&engine);

    engine.start();
    clock.advance(1);

    let completions = completions.lock().unwrap();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].next_type, SessionType::LongBreak);
}

#[test]
fn test_settings_persist_across_engines() {
    let dir = tempfile::tempdir().unwrap();

    {
        let engine = TimerEngine::new(
            Arc::new(ManualScheduler::new()),
            Box::new(FileStore::new(dir.path())),
        );
        engine.update_settings(&SettingsPatch {
            work_duration: Some(50 * 60),
            auto_start_breaks: Some(true),
            ..Default::default()
        });
    }

    let engine = TimerEngine::new(
        Arc::new(ManualScheduler::new()),
        Box::new(FileStore::new(dir.path())),
    );
    let settings = engine.settings();
    assert_eq!(settings.work_duration, 3000);
    assert!(settings.auto_start_breaks);
    assert_eq!(engine.session().total_time, 3000);

    let raw = FileStore::new(dir.path()).read(SETTINGS_KEY).unwrap().unwrap();
    assert!(raw.contains("\"workDuration\":3000"));
}

#[test]
fn test_independent_engines_do_not_share_state() {
    let (first, first_clock, _) = create_engine();
    let (second, _, _) = create_engine();

    first.start();
    first_clock.advance(10);

    assert_eq!(first.session().time_remaining, 1490);
    assert_eq!(second.session().time_remaining, 1500);
    assert!(!second.is_driving());
}

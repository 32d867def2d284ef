//! Settings persistence on top of a [`KeyValueStore`].
//!
//! Loading never fails. A missing blob, unreadable storage, malformed JSON or
//! a non-object value all yield the defaults; a valid object is merged over
//! the defaults one field at a time so a blob written by an older version
//! (or edited by hand) keeps every field it got right.

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use super::{KeyValueStore, StorageError, SETTINGS_KEY};
use crate::types::{SettingsPatch, TimerSettings};

/// Owns the current settings and writes every change through to the backend.
pub struct SettingsStore {
    backend: Box<dyn KeyValueStore>,
    current: TimerSettings,
}

impl SettingsStore {
    /// Creates a store over `backend` and loads the persisted settings.
    pub fn open(backend: Box<dyn KeyValueStore>) -> Self {
        let mut store = Self {
            backend,
            current: TimerSettings::default(),
        };
        store.load();
        store
    }

    /// Re-reads the persisted settings, replacing the in-memory copy.
    pub fn load(&mut self) -> TimerSettings {
        self.current = match self.backend.read(SETTINGS_KEY) {
            Ok(Some(blob)) => parse_settings(&blob),
            Ok(None) => {
                debug!("no saved settings, using defaults");
                TimerSettings::default()
            }
            Err(e) => {
                warn!("failed to read settings, using defaults: {}", e);
                TimerSettings::default()
            }
        };
        self.current.clone()
    }

    /// Writes `settings` as the full settings object.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn save(&self, settings: &TimerSettings) {
        let result = serde_json::to_string(settings)
            .map_err(StorageError::from)
            .and_then(|blob| self.backend.write(SETTINGS_KEY, &blob));

        if let Err(e) = result {
            error!("failed to save settings: {}", e);
        }
    }

    /// Merges `patch` into the current settings, persists, and returns the result.
    ///
    /// The in-memory update takes effect even if persisting fails.
    pub fn update(&mut self, patch: &SettingsPatch) -> TimerSettings {
        self.current.apply(patch);
        self.save(&self.current);
        info!(?patch, "settings updated");
        self.current.clone()
    }

    pub fn current(&self) -> &TimerSettings {
        &self.current
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

/// Parses a persisted settings blob, falling back to defaults field by field.
///
/// Durations and the long-break interval are clamped to at least 1; fields
/// of the wrong JSON type are ignored.
pub fn parse_settings(blob: &str) -> TimerSettings {
    let mut settings = TimerSettings::default();

    let object = match serde_json::from_str::<Value>(blob) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            warn!("saved settings are not an object ({}), using defaults", kind(&other));
            return settings;
        }
        Err(e) => {
            warn!("saved settings are not valid JSON, using defaults: {}", e);
            return settings;
        }
    };

    merge_count(&object, "workDuration", &mut settings.work_duration);
    merge_count(&object, "shortBreakDuration", &mut settings.short_break_duration);
    merge_count(&object, "longBreakDuration", &mut settings.long_break_duration);
    merge_count(
        &object,
        "sessionsBeforeLongBreak",
        &mut settings.sessions_before_long_break,
    );
    merge_flag(&object, "autoStartBreaks", &mut settings.auto_start_breaks);
    merge_flag(&object, "autoStartSessions", &mut settings.auto_start_sessions);
    merge_flag(&object, "soundEnabled", &mut settings.sound_enabled);

    settings
}

fn merge_count(object: &Map<String, Value>, key: &str, target: &mut u32) {
    let Some(value) = object.get(key) else {
        return;
    };
    match value.as_f64().filter(|n| n.is_finite()) {
        // `as` saturates, so anything above u32::MAX lands on u32::MAX
        Some(n) => *target = n.round().max(1.0) as u32,
        None => warn!("ignoring saved {} of type {}", key, kind(value)),
    }
}

fn merge_flag(object: &Map<String, Value>, key: &str, target: &mut bool) {
    let Some(value) = object.get(key) else {
        return;
    };
    match value.as_bool() {
        Some(flag) => *target = flag,
        None => warn!("ignoring saved {} of type {}", key, kind(value)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Tests
// ============================================================================

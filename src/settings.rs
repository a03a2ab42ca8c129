use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use crate::models::{is_allowed_duration, DEFAULT_DURATION_MINUTES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerSettings {
    pub default_duration_minutes: u32,
    pub tick_interval_ms: u64,
    pub heartbeat_every_ticks: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            tick_interval_ms: 100,
            heartbeat_every_ticks: 10,
        }
    }
}

impl TimerSettings {
    /// Applies `STILLPOINT_DEBUG`, which forces a heartbeat on every tick.
    pub fn with_env_overrides(mut self) -> Self {
        let debug_mode = std::env::var("STILLPOINT_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            self.heartbeat_every_ticks = 1;
        }
        self
    }

    /// Replaces out-of-range values with defaults so a hand-edited file can
    /// never produce a timer that ticks slower than once per second.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !is_allowed_duration(self.default_duration_minutes) {
            warn!(
                "Ignoring unsupported default duration {} minutes",
                self.default_duration_minutes
            );
            self.default_duration_minutes = defaults.default_duration_minutes;
        }
        if self.tick_interval_ms == 0 || self.tick_interval_ms > 1000 {
            warn!("Ignoring tick interval {}ms", self.tick_interval_ms);
            self.tick_interval_ms = defaults.tick_interval_ms;
        }
        if self.heartbeat_every_ticks == 0 {
            self.heartbeat_every_ticks = defaults.heartbeat_every_ticks;
        }
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct UserSettings {
    #[serde(default)]
    timer: TimerSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Settings file {} is invalid, using defaults: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn timer(&self) -> TimerSettings {
        let guard = match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.timer.clone().sanitized()
    }

    pub fn update_timer(&self, settings: TimerSettings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        guard.timer = settings.sanitized();
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.timer(), TimerSettings::default());
    }

    #[test]
    fn test_update_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let settings = TimerSettings {
            default_duration_minutes: 20,
            tick_interval_ms: 250,
            heartbeat_every_ticks: 4,
        };
        store.update_timer(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.timer(), settings);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.timer(), TimerSettings::default());
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "timer": { "default_duration_minutes": 15 } }"#).unwrap();

        let store = SettingsStore::new(path).unwrap();
        let timer = store.timer();
        assert_eq!(timer.default_duration_minutes, 15);
        assert_eq!(timer.tick_interval_ms, 100);
    }

    #[test]
    fn test_sanitized_rejects_out_of_range_values() {
        let settings = TimerSettings {
            default_duration_minutes: 3,
            tick_interval_ms: 5000,
            heartbeat_every_ticks: 0,
        }
        .sanitized();

        assert_eq!(settings, TimerSettings::default());
    }
}

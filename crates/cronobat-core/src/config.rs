//! TOML-based application configuration.
//!
//! Holds the tunables of the session machine and the distraction monitor:
//! - Pomodoro focus/break lengths and an optional cycle bound
//! - Timer limits and tick cadence
//! - Poll cadence, startup lookback, cooldown and the distracting apps
//! - Intervention dwell
//!
//! Configuration is read from `~/.config/cronobat/config.toml`. A missing file
//! means defaults. The app never writes it back: changes made while running
//! stay in memory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::monitor::{DistractionSet, PollerSettings, DEFAULT_DISTRACTING_APPS};
use crate::session::SessionSettings;

/// Pomodoro configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    /// Stop after this many Focus+Break cycles. Unset alternates forever.
    #[serde(default)]
    pub max_cycles: Option<u32>,
}

/// Timer/stopwatch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Distraction monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_startup_lookback_ms")]
    pub startup_lookback_ms: u64,
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    #[serde(default = "default_distracting_apps")]
    pub distracting_apps: Vec<String>,
}

/// Intervention configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionConfig {
    #[serde(default = "default_dwell_ms")]
    pub dwell_ms: u64,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub intervention: InterventionConfig,
}

// Default functions
fn default_focus_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_max_duration_secs() -> u64 {
    3600
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_poll_interval_ms() -> u64 {
    1500
}
fn default_startup_lookback_ms() -> u64 {
    2000
}
fn default_cooldown_ms() -> u64 {
    4000
}
fn default_dwell_ms() -> u64 {
    600
}
fn default_distracting_apps() -> Vec<String> {
    DEFAULT_DISTRACTING_APPS.iter().map(|s| s.to_string()).collect()
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            break_minutes: default_break_minutes(),
            max_cycles: None,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration_secs(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            startup_lookback_ms: default_startup_lookback_ms(),
            cooldown_ms: default_cooldown_ms(),
            distracting_apps: default_distracting_apps(),
        }
    }
}

impl Default for InterventionConfig {
    fn default() -> Self {
        Self {
            dwell_ms: default_dwell_ms(),
        }
    }
}

/// Returns `~/.config/cronobat[-dev]/` based on CRONOBAT_ENV.
///
/// Set CRONOBAT_ENV=dev to use the development directory.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .ok_or(ConfigError::NoConfigDir)?
        .join(".config");

    let env = std::env::var("CRONOBAT_ENV").unwrap_or_else(|_| "production".to_string());

    Ok(if env == "dev" {
        base_dir.join("cronobat-dev")
    } else {
        base_dir.join("cronobat")
    })
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(config_dir()?.join("config.toml"))
    }

    /// Load from the default location, or defaults if there is no file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, or defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        let cfg: Config = toml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("pomodoro.focus_minutes", u64::from(self.pomodoro.focus_minutes)),
            ("pomodoro.break_minutes", u64::from(self.pomodoro.break_minutes)),
            ("timer.tick_interval_ms", self.timer.tick_interval_ms),
            ("monitor.poll_interval_ms", self.monitor.poll_interval_ms),
        ];
        let cycles = self.pomodoro.max_cycles.map(u64::from);
        for (key, value) in positive.into_iter().chain(cycles.map(|c| ("pomodoro.max_cycles", c))) {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "must be at least 1".into(),
                });
            }
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            focus_minutes: self.pomodoro.focus_minutes,
            break_minutes: self.pomodoro.break_minutes,
            max_cycles: self.pomodoro.max_cycles,
            max_timer_secs: self.timer.max_duration_secs,
            tick_interval_ms: self.timer.tick_interval_ms,
        }
    }

    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            interval_ms: self.monitor.poll_interval_ms,
            startup_lookback_ms: self.monitor.startup_lookback_ms,
        }
    }

    pub fn distraction_set(&self) -> DistractionSet {
        self.monitor.distracting_apps.iter().cloned().collect()
    }
}

//! Watcher configuration: JSON file layered with environment overrides.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Data directory (event database)
    pub data_dir: PathBuf,
    /// Database file name inside `data_dir`
    pub db_file: String,
    /// Brute-force window rule
    pub window: WindowConfig,
    /// Isolation forest parameters
    pub scorer: ScorerConfig,
    /// Alert delivery
    pub alert: AlertConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Trailing window length (seconds)
    pub window_secs: u64,
    /// Failures inside the window that trigger an alert
    pub threshold: u64,
    /// Event type counted by the rule
    pub event_type: String,
    pub repeat_policy: RepeatPolicy,
}

/// What to do when an actor keeps failing after the first alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Alert on every qualifying event
    EveryEvent,
    /// Drop alerts for an actor for `cooldown_secs` after one was sent
    Suppress { cooldown_secs: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Expected fraction of anomalous actors (0.0–0.5]
    pub contamination: f64,
    /// RNG seed; same seed and same events give the same labels
    pub seed: u64,
    pub n_trees: usize,
    /// Per-tree subsample size upper bound
    pub max_samples: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub telegram_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".authwatch"),
            db_file: "events.db".to_string(),
            window: WindowConfig::default(),
            scorer: ScorerConfig::default(),
            alert: AlertConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_secs: 600,
            threshold: 5,
            event_type: crate::events::LOGIN_FAILED.to_string(),
            repeat_policy: RepeatPolicy::EveryEvent,
        }
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            contamination: 0.2,
            seed: 42,
            n_trees: 100,
            max_samples: 256,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            telegram_token: None,
            chat_id: None,
            api_base: "https://api.telegram.org".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

/// Upper bound for the window and the repeat-alert cooldown (366 days).
pub const MAX_RULE_SECS: u64 = 366 * 24 * 3600;

fn env_parse<T: std::str::FromStr>(key: &'static str, errors: &mut Vec<ConfigError>) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.push(ConfigError::EnvOverride { key, value: raw });
            None
        }
    }
}

impl WatchConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        Self::try_load(path).unwrap_or_else(|e| {
            warn!(error = %e, "using default config");
            Self::default()
        })
    }

    /// Defaults when the file is absent; an unreadable or malformed file is an error.
    /// Callers that load before the logger is installed report the error afterwards.
    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&data).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply `TELEGRAM_TOKEN`, `CHAT_ID` and `AUTHWATCH_*` overrides.
    /// Unparseable values are skipped and returned.
    pub fn apply_env(&mut self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Ok(token) = std::env::var("TELEGRAM_TOKEN") {
            self.alert.telegram_token = Some(token);
        }
        if let Ok(chat) = std::env::var("CHAT_ID") {
            self.alert.chat_id = Some(chat);
        }
        if let Ok(dir) = std::env::var("AUTHWATCH_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(v) = env_parse("AUTHWATCH_WINDOW_SECS", &mut errors) {
            self.window.window_secs = v;
        }
        if let Some(v) = env_parse("AUTHWATCH_FAIL_THRESHOLD", &mut errors) {
            self.window.threshold = v;
        }
        if let Some(v) = env_parse("AUTHWATCH_CONTAMINATION", &mut errors) {
            self.scorer.contamination = v;
        }
        if let Some(v) = env_parse("AUTHWATCH_SEED", &mut errors) {
            self.scorer.seed = v;
        }
        errors
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = self.scorer.contamination;
        if !(c > 0.0 && c <= 0.5) {
            return Err(ConfigError::InvalidValue {
                field: "scorer.contamination",
                message: format!("{c} is outside (0, 0.5]"),
            });
        }
        if self.window.threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.threshold",
                message: "must be at least 1".into(),
            });
        }
        if self.window.window_secs == 0 || self.window.window_secs > MAX_RULE_SECS {
            return Err(ConfigError::InvalidValue {
                field: "window.window_secs",
                message: format!("must be between 1 and {MAX_RULE_SECS}"),
            });
        }
        if let RepeatPolicy::Suppress { cooldown_secs } = self.window.repeat_policy {
            if cooldown_secs > MAX_RULE_SECS {
                return Err(ConfigError::InvalidValue {
                    field: "window.repeat_policy.cooldown_secs",
                    message: format!("must be at most {MAX_RULE_SECS}"),
                });
            }
        }
        if self.scorer.n_trees == 0 || self.scorer.max_samples == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scorer",
                message: "n_trees and max_samples must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }
}

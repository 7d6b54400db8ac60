//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Reminder interval and notification text
//! - Session screen route and rest tick period
//! - Location of the plan file
//!
//! Configuration is stored at `~/.config/physique/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;
use crate::lifecycle::DEFAULT_SESSION_ROUTE;
use crate::reminder::{ReminderSettings, DEFAULT_REMINDER_TITLE};
use crate::session::{SessionSettings, DEFAULT_FINISH_PROMPT};

/// Reminder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_notification_id")]
    pub notification_id: i32,
    #[serde(default = "default_sound")]
    pub sound: Option<String>,
}

/// Active-training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_screen_route")]
    pub screen_route: String,
    #[serde(default = "default_rest_tick_ms")]
    pub rest_tick_ms: u64,
    #[serde(default = "default_finish_prompt")]
    pub finish_prompt: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/physique/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub session: SessionConfig,
    /// Plan file override; defaults to `plans.toml` next to the config.
    #[serde(default)]
    pub plans_file: Option<PathBuf>,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_interval_secs() -> u64 {
    5
}
fn default_title() -> String {
    DEFAULT_REMINDER_TITLE.into()
}
fn default_notification_id() -> i32 {
    1
}
fn default_sound() -> Option<String> {
    Some("default".into())
}
fn default_screen_route() -> String {
    DEFAULT_SESSION_ROUTE.into()
}
fn default_rest_tick_ms() -> u64 {
    1000
}
fn default_finish_prompt() -> String {
    DEFAULT_FINISH_PROMPT.into()
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            title: default_title(),
            body: String::new(),
            notification_id: default_notification_id(),
            sound: default_sound(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            screen_route: default_screen_route(),
            rest_tick_ms: default_rest_tick_ms(),
            finish_prompt: default_finish_prompt(),
        }
    }
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

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Unset optional fields are strings or paths.
                    serde_json::Value::Null | serde_json::Value::String(_) => {
                        serde_json::Value::String(value.into())
                    }
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Like [`Config::load`] for an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| load_failed(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(load_failed(e.to_string())),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Set a config value in memory. Returns error if key is unknown or the
    /// value does not fit the field.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    pub fn reminder_settings(&self) -> ReminderSettings {
        ReminderSettings {
            interval: Duration::from_secs(self.reminders.interval_secs.max(1)),
            title: self.reminders.title.clone(),
            body: self.reminders.body.clone(),
            notification_id: self.reminders.notification_id,
            sound: self.reminders.sound.clone(),
        }
    }

    /// Countdown tick period, never zero.
    pub fn rest_tick(&self) -> Duration {
        Duration::from_millis(self.session.rest_tick_ms.max(1))
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            rest_tick: self.rest_tick(),
            finish_prompt: self.session.finish_prompt.clone(),
        }
    }

    /// Where the plan store lives.
    pub fn plans_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.plans_file {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("plans.toml")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.reminders.interval_secs, 5);
        assert_eq!(parsed.session.screen_route, "active-training");
        assert_eq!(parsed.reminders.sound.as_deref(), Some("default"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[reminders]\ninterval_secs = 10\n").unwrap();
        assert_eq!(parsed.reminders.interval_secs, 10);
        assert!(parsed.reminders.enabled);
        assert_eq!(parsed.session.rest_tick_ms, 1000);
        assert!(parsed.plans_file.is_none());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("reminders.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("reminders.interval_secs").as_deref(), Some("5"));
        assert_eq!(cfg.get("session.screen_route").as_deref(), Some("active-training"));
        assert!(cfg.get("reminders.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_value_updates_typed_fields() {
        let mut cfg = Config::default();
        cfg.set_value("reminders.interval_secs", "10").unwrap();
        cfg.set_value("reminders.enabled", "false").unwrap();
        cfg.set_value("reminders.title", "Back to the bar").unwrap();
        cfg.set_value("reminders.notification_id", "-3").unwrap();

        assert_eq!(cfg.reminders.interval_secs, 10);
        assert!(!cfg.reminders.enabled);
        assert_eq!(cfg.reminders.title, "Back to the bar");
        assert_eq!(cfg.reminders.notification_id, -3);
        assert_eq!(cfg.reminder_settings().interval, Duration::from_secs(10));
    }

    #[test]
    fn set_value_rejects_unknown_key() {
        let mut cfg = Config::default();
        let result = cfg.set_value("reminders.nonexistent_key", "value");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_value_rejects_invalid_type() {
        let mut cfg = Config::default();
        let result = cfg.set_value("reminders.enabled", "not_a_bool");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        let result = cfg.set_value("session.rest_tick_ms", "-5");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
        assert_eq!(cfg.session.rest_tick_ms, 1000);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.reminders.interval_secs, 5);
        assert!(path.exists());

        let mut cfg = cfg;
        cfg.set_value("session.rest_tick_ms", "250").unwrap();
        cfg.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.rest_tick(), Duration::from_millis(250));
        assert_eq!(reloaded.session_settings().rest_tick, Duration::from_millis(250));
    }

    #[test]
    fn plans_file_can_be_set_and_read() {
        let mut cfg = Config::default();
        assert_eq!(cfg.get("plans_file").as_deref(), Some("null"));

        cfg.set_value("plans_file", "/tmp/plans/mine.toml").unwrap();
        assert_eq!(cfg.plans_file, Some(PathBuf::from("/tmp/plans/mine.toml")));
        assert_eq!(cfg.get("plans_file").as_deref(), Some("/tmp/plans/mine.toml"));
        assert_eq!(cfg.plans_path().unwrap(), PathBuf::from("/tmp/plans/mine.toml"));

        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.plans_file, cfg.plans_file);
    }

    #[test]
    fn unset_plans_file_is_left_out_of_toml() {
        let toml_str = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(!toml_str.contains("plans_file"));
    }

    #[test]
    fn load_from_unreadable_file_keeps_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut content = b"[reminders]\ninterval_secs = 42\ntitle = \"".to_vec();
        content.extend_from_slice(&[0xff, 0xfe]);
        content.extend_from_slice(b"\"\n");
        std::fs::write(&path, &content).unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::LoadFailed { .. })));
        assert_eq!(std::fs::read(&path).unwrap(), content);
    }

    #[test]
    fn load_from_broken_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "reminders = 3").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::LoadFailed { .. })));
    }
}

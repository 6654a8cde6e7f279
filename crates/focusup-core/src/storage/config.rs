//! TOML-based application configuration.
//!
//! Stores tunables rather than user settings:
//! - Timer length and tick interval
//! - Time-on-site warning threshold and check interval
//! - Nudge cooldown and default grant length
//! - Built-in block list
//! - Page monitor settle delays
//!
//! Configuration is stored at `~/.config/focusup/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::coordinator::CoordinatorConfig;
use crate::error::ConfigError;
use crate::site::BUILTIN_SITES;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u64,
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_warning_threshold_secs")]
    pub warning_threshold_secs: u64,
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NudgeConfig {
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantConfig {
    #[serde(default = "default_grant_minutes")]
    pub default_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlocklistConfig {
    #[serde(default = "default_builtin_sites")]
    pub builtin: Vec<String>,
}

/// Page monitor timings, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
    /// Second look after the initial check, for late-rendering pages.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Delay between a detected URL change and the re-check.
    #[serde(default = "default_recheck_delay_ms")]
    pub recheck_delay_ms: u64,
    /// Delay after an intercepted history call before reading the URL.
    #[serde(default = "default_history_delay_ms")]
    pub history_delay_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_grant_minutes")]
    pub grace_minutes: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusup/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub nudge: NudgeConfig,
    #[serde(default)]
    pub grant: GrantConfig,
    #[serde(default)]
    pub blocklist: BlocklistConfig,
    #[serde(default)]
    pub page: PageConfig,
}

// Default functions
fn default_duration_secs() -> u64 {
    25 * 60
}
fn default_tick_interval_secs() -> u64 {
    1
}
fn default_warning_threshold_secs() -> u64 {
    5 * 60
}
fn default_check_interval_secs() -> u64 {
    30
}
fn default_cooldown_secs() -> u64 {
    30
}
fn default_grant_minutes() -> u64 {
    5
}
fn default_builtin_sites() -> Vec<String> {
    BUILTIN_SITES.iter().map(|s| s.to_string()).collect()
}
fn default_settle_delay_ms() -> u64 {
    2000
}
fn default_recheck_delay_ms() -> u64 {
    500
}
fn default_history_delay_ms() -> u64 {
    100
}
fn default_poll_interval_ms() -> u64 {
    2000
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: default_duration_secs(),
            tick_interval_secs: default_tick_interval_secs(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            warning_threshold_secs: default_warning_threshold_secs(),
            check_interval_secs: default_check_interval_secs(),
        }
    }
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl Default for GrantConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_grant_minutes(),
        }
    }
}

impl Default for BlocklistConfig {
    fn default() -> Self {
        Self {
            builtin: default_builtin_sites(),
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            recheck_delay_ms: default_recheck_delay_ms(),
            history_delay_ms: default_history_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            grace_minutes: default_grant_minutes(),
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
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
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

    /// Set a config value by key without saving. Returns error if the key
    /// is unknown or the value has the wrong type.
    pub fn update(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
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
        self.update(key, value)?;
        self.save()
    }

    /// Runtime settings for the background coordinator.
    pub fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig::from(self)
    }

    /// Timings for page monitors.
    pub fn page(&self) -> PageConfig {
        self.page.clone()
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
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[nudge]\ncooldown_secs = 10\n").unwrap();
        assert_eq!(parsed.nudge.cooldown_secs, 10);
        assert_eq!(parsed.timer.default_duration_secs, 1500);
        assert_eq!(parsed.blocklist.builtin.len(), BUILTIN_SITES.len());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("nudge.cooldown_secs").as_deref(), Some("30"));
        assert_eq!(cfg.get("tracking.warning_threshold_secs").as_deref(), Some("300"));
        assert!(cfg.get("nudge.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn update_changes_number() {
        let mut cfg = Config::default();
        cfg.update("grant.default_minutes", "10").unwrap();
        assert_eq!(cfg.grant.default_minutes, 10);
    }

    #[test]
    fn update_changes_array() {
        let mut cfg = Config::default();
        cfg.update("blocklist.builtin", r#"["example.com"]"#).unwrap();
        assert_eq!(cfg.blocklist.builtin, vec!["example.com".to_string()]);
    }

    #[test]
    fn coordinator_config_uses_milliseconds() {
        let mut cfg = Config::default();
        cfg.update("tracking.warning_threshold_secs", "120").unwrap();
        let runtime = cfg.coordinator();
        assert_eq!(runtime.warning_threshold_ms, 120_000);
        assert_eq!(runtime.cooldown_ms, 30_000);
        assert_eq!(runtime.builtin_sites.len(), BUILTIN_SITES.len());
        assert_eq!(cfg.page().settle_delay_ms, 2000);
    }

    #[test]
    fn update_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.update("nudge.volume", "3").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));
    }

    #[test]
    fn update_rejects_invalid_type() {
        let mut cfg = Config::default();
        let err = cfg.update("nudge.cooldown_secs", "soon").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(cfg.nudge.cooldown_secs, 30);
    }
}

//! TOML-based application configuration.
//!
//! Stores operational settings including:
//! - Scheduler intervals for milestone and deadline evaluation
//! - Deadline classification and throttle windows
//! - Notification log capacity
//! - Default log filter
//!
//! Configuration is stored at `~/.config/goalsave/config.toml`. User-facing
//! notification preferences live in [`crate::notification::NotificationSettings`]
//! instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// Longest accepted scheduler or poll interval: one year.
pub const MAX_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

/// Longest accepted deadline throttle window: ten years.
pub const MAX_THROTTLE_HOURS: i64 = 10 * 365 * 24;

/// Evaluation cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfigSection {
    #[serde(default = "default_milestone_interval")]
    pub milestone_interval_secs: u64,
    #[serde(default = "default_deadline_interval")]
    pub deadline_interval_secs: u64,
    /// How often `watch` re-reads the goals file.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

/// Deadline classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineConfig {
    #[serde(default = "default_urgent_days")]
    pub urgent_days: i64,
    #[serde(default = "default_throttle_hours")]
    pub throttle_hours: i64,
    /// Upper bound of the "approaching" tier; 0 disables it.
    #[serde(default)]
    pub approaching_days: i64,
}

/// Notification log limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_max_notifications")]
    pub max_notifications: usize,
}

/// Logging defaults; `RUST_LOG` takes precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfigSection,
    #[serde(default)]
    pub deadlines: DeadlineConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_milestone_interval() -> u64 {
    30
}
fn default_deadline_interval() -> u64 {
    3600
}
fn default_poll_interval() -> u64 {
    5
}
fn default_urgent_days() -> i64 {
    3
}
fn default_throttle_hours() -> i64 {
    24
}
fn default_max_notifications() -> usize {
    50
}
fn default_log_filter() -> String {
    "warn".into()
}

impl Default for SchedulerConfigSection {
    fn default() -> Self {
        Self {
            milestone_interval_secs: default_milestone_interval(),
            deadline_interval_secs: default_deadline_interval(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            urgent_days: default_urgent_days(),
            throttle_hours: default_throttle_hours(),
            approaching_days: 0,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_notifications: default_max_notifications(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn clamped_interval(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(1, MAX_INTERVAL_SECS))
}

impl SchedulerConfigSection {
    pub fn milestone_interval(&self) -> Duration {
        clamped_interval(self.milestone_interval_secs)
    }

    pub fn deadline_interval(&self) -> Duration {
        clamped_interval(self.deadline_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        clamped_interval(self.poll_interval_secs)
    }
}

/// Navigate a dot-separated key through a JSON tree.
pub(crate) fn get_json_value_by_path<'a>(
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

/// Replace the value at a dot-separated key, parsing `value` according to
/// the type of the value already there. Unknown keys are rejected.
pub(crate) fn set_json_value_by_path(
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
    if key.is_empty() {
        return Err(unknown());
    }

    let mut current = root;
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<i64>() {
                        serde_json::Value::Number(n.into())
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as integer")));
                    }
                }
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

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
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
        let val = get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Callers persist with [`Config::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        set_json_value_by_path(&mut json, key, value)?;
        let next: Self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Reject values the scheduler and deadline policy cannot represent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let out_of_range = |key: &str, message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let intervals = [
            ("scheduler.milestone_interval_secs", self.scheduler.milestone_interval_secs),
            ("scheduler.deadline_interval_secs", self.scheduler.deadline_interval_secs),
            ("scheduler.poll_interval_secs", self.scheduler.poll_interval_secs),
        ];
        for (key, secs) in intervals {
            if !(1..=MAX_INTERVAL_SECS).contains(&secs) {
                return Err(out_of_range(
                    key,
                    format!("must be between 1 and {MAX_INTERVAL_SECS} seconds"),
                ));
            }
        }

        if !(0..=MAX_THROTTLE_HOURS).contains(&self.deadlines.throttle_hours) {
            return Err(out_of_range(
                "deadlines.throttle_hours",
                format!("must be between 0 and {MAX_THROTTLE_HOURS} hours"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.scheduler.milestone_interval_secs, 30);
        assert_eq!(cfg.scheduler.deadline_interval_secs, 3600);
        assert_eq!(cfg.deadlines.urgent_days, 3);
        assert_eq!(cfg.deadlines.throttle_hours, 24);
        assert_eq!(cfg.deadlines.approaching_days, 0);
        assert_eq!(cfg.store.max_notifications, 50);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [scheduler]
            deadline_interval_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(cfg.scheduler.deadline_interval_secs, 60);
        assert_eq!(cfg.scheduler.milestone_interval_secs, 30);
        assert_eq!(cfg.store.max_notifications, 50);
    }

    #[test]
    fn get_and_set_by_dotted_key() {
        let mut cfg = Config::default();
        assert_eq!(cfg.get("deadlines.urgent_days").as_deref(), Some("3"));
        cfg.set("deadlines.urgent_days", "5").unwrap();
        assert_eq!(cfg.deadlines.urgent_days, 5);
        cfg.set("logging.filter", "debug").unwrap();
        assert_eq!(cfg.logging.filter, "debug");

        assert!(matches!(
            cfg.set("deadlines.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("store.max_notifications", "many"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_rejects_out_of_range_durations() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("deadlines.throttle_hours", "9000000000000000"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("deadlines.throttle_hours", "-1"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("scheduler.milestone_interval_secs", &u64::MAX.to_string()),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            cfg.set("scheduler.poll_interval_secs", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, Config::default());

        cfg.set("deadlines.throttle_hours", &MAX_THROTTLE_HOURS.to_string())
            .unwrap();
        cfg.set("scheduler.deadline_interval_secs", &MAX_INTERVAL_SECS.to_string())
            .unwrap();
    }

    #[test]
    fn load_from_rejects_out_of_range_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[deadlines]\nthrottle_hours = 9000000000000000\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn interval_accessors_stay_in_range() {
        let section = SchedulerConfigSection {
            milestone_interval_secs: u64::MAX,
            deadline_interval_secs: 0,
            poll_interval_secs: 5,
        };
        assert_eq!(section.milestone_interval(), Duration::from_secs(MAX_INTERVAL_SECS));
        assert_eq!(section.deadline_interval(), Duration::from_secs(1));
        let start = tokio::time::Instant::now();
        assert!(start.checked_add(section.milestone_interval()).is_some());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.store.max_notifications = 10;
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().store.max_notifications, 10);
    }
}

//! User notification preferences.
//!
//! Loaded once when the store opens, changed through
//! [`SettingsPatch`] or a dotted-key `set`, and persisted on every change.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConfigError, CoreError, ValidationError};
use crate::monitor::AchievementKind;
use crate::storage::config::{get_json_value_by_path, set_json_value_by_path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneConfig {
    pub percentage: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderFrequency {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    pub enabled: bool,
    pub frequency: ReminderFrequency,
    /// Preferred time of day, `HH:MM`.
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementSettings {
    pub enabled: bool,
    /// Unrecognised names, such as `streak` from older settings, are dropped.
    #[serde(deserialize_with = "known_achievement_kinds")]
    pub types: Vec<AchievementKind>,
}

fn known_achievement_kinds<'de, D>(deserializer: D) -> Result<Vec<AchievementKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(names
        .into_iter()
        .filter_map(|name| serde_json::from_value(name).ok())
        .collect())
}

/// Mirror of the platform's notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformPermission {
    #[default]
    Default,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlatformSettings {
    pub enabled: bool,
    pub permission: PlatformPermission,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_milestones")]
    pub milestones: Vec<MilestoneConfig>,
    #[serde(default)]
    pub reminders: ReminderSettings,
    #[serde(default)]
    pub achievements: AchievementSettings,
    #[serde(default, alias = "browser")]
    pub platform: PlatformSettings,
}

fn default_milestones() -> Vec<MilestoneConfig> {
    [25, 50, 75, 100]
        .into_iter()
        .map(|percentage| MilestoneConfig {
            percentage,
            enabled: true,
        })
        .collect()
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency: ReminderFrequency::Weekly,
            time: "09:00".into(),
        }
    }
}

impl Default for AchievementSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            types: vec![
                AchievementKind::FirstGoal,
                AchievementKind::GoalCompleted,
            ],
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            milestones: default_milestones(),
            reminders: ReminderSettings::default(),
            achievements: AchievementSettings::default(),
            platform: PlatformSettings::default(),
        }
    }
}

/// Partial update: each present section replaces the current one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default)]
    pub milestones: Option<Vec<MilestoneConfig>>,
    #[serde(default)]
    pub reminders: Option<ReminderSettings>,
    #[serde(default)]
    pub achievements: Option<AchievementSettings>,
    #[serde(default, alias = "browser")]
    pub platform: Option<PlatformSettings>,
}

impl NotificationSettings {
    /// Enabled thresholds, ascending and deduplicated.
    pub fn enabled_thresholds(&self) -> Vec<u32> {
        let mut thresholds: Vec<u32> = self
            .milestones
            .iter()
            .filter(|m| m.enabled)
            .map(|m| m.percentage)
            .collect();
        thresholds.sort_unstable();
        thresholds.dedup();
        thresholds
    }

    /// Whether an achievement of this kind should reach the log.
    pub fn allows_achievement(&self, kind: AchievementKind) -> bool {
        self.achievements.enabled && self.achievements.types.contains(&kind)
    }

    pub fn platform_delivery_allowed(&self) -> bool {
        self.platform.enabled && self.platform.permission == PlatformPermission::Granted
    }

    /// Shallow merge of `patch` into a copy of `self`.
    pub fn merged(&self, patch: SettingsPatch) -> Self {
        let mut next = self.clone();
        if let Some(milestones) = patch.milestones {
            next.milestones = milestones;
        }
        if let Some(reminders) = patch.reminders {
            next.reminders = reminders;
        }
        if let Some(achievements) = patch.achievements {
            next.achievements = achievements;
        }
        if let Some(platform) = patch.platform {
            next.platform = platform;
        }
        next
    }

    /// # Errors
    /// Returns an error if the reminder time is not `HH:MM`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        NaiveTime::parse_from_str(&self.reminders.time, "%H:%M").map_err(|e| {
            ValidationError::InvalidValue {
                field: "reminders.time".into(),
                message: format!("'{}' is not HH:MM ({e})", self.reminders.time),
            }
        })?;
        Ok(())
    }

    /// Get a value as string by dot-separated key, e.g. `reminders.time`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match get_json_value_by_path(&json, key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Produce a copy with one dotted key replaced; the result is validated.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value does not fit.
    pub fn with_value(&self, key: &str, value: &str) -> Result<Self, CoreError> {
        let mut json = serde_json::to_value(self)?;
        set_json_value_by_path(&mut json, key, value)?;
        let next: Self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        next.validate()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_thresholds_are_sorted_and_filtered() {
        let settings = NotificationSettings {
            milestones: vec![
                MilestoneConfig { percentage: 75, enabled: true },
                MilestoneConfig { percentage: 25, enabled: true },
                MilestoneConfig { percentage: 50, enabled: false },
                MilestoneConfig { percentage: 25, enabled: true },
            ],
            ..Default::default()
        };
        assert_eq!(settings.enabled_thresholds(), vec![25, 75]);
    }

    #[test]
    fn patch_replaces_only_present_sections() {
        let base = NotificationSettings::default();
        let patched = base.merged(SettingsPatch {
            platform: Some(PlatformSettings {
                enabled: true,
                permission: PlatformPermission::Granted,
            }),
            ..Default::default()
        });
        assert!(patched.platform_delivery_allowed());
        assert_eq!(patched.milestones, base.milestones);
        assert_eq!(patched.reminders, base.reminders);
    }

    #[test]
    fn unknown_achievement_types_are_ignored() {
        let json = r#"{"achievements": {"enabled": true, "types": ["first_goal", "streak"]}}"#;
        let settings: NotificationSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.achievements.types, vec![AchievementKind::FirstGoal]);
        assert!(!settings.allows_achievement(AchievementKind::GoalCompleted));
    }

    #[test]
    fn legacy_browser_section_is_accepted() {
        let json = r#"{"browser": {"enabled": true, "permission": "denied"}}"#;
        let settings: NotificationSettings = serde_json::from_str(json).unwrap();
        assert!(settings.platform.enabled);
        assert_eq!(settings.platform.permission, PlatformPermission::Denied);
        assert_eq!(settings.enabled_thresholds(), vec![25, 50, 75, 100]);
    }

    #[test]
    fn dotted_set_validates() {
        let settings = NotificationSettings::default();
        let next = settings.with_value("reminders.time", "18:30").unwrap();
        assert_eq!(next.get("reminders.time").as_deref(), Some("18:30"));
        assert!(settings.with_value("reminders.time", "6pm").is_err());
        assert!(settings.with_value("reminders.frequency", "hourly").is_err());
        assert!(settings.with_value("reminders.volume", "3").is_err());

        let next = settings.with_value("achievements.enabled", "false").unwrap();
        assert!(!next.allows_achievement(AchievementKind::FirstGoal));
    }
}

//! Notification log, user settings and platform delivery.

pub mod log;
pub mod platform;
mod settings;
pub mod store;
mod types;

pub use log::{LogAction, NotificationLog};
pub use platform::{NoopNotifier, PlatformError, PlatformNotifier};
pub use settings::{
    AchievementSettings, MilestoneConfig, NotificationSettings, PlatformPermission,
    PlatformSettings, ReminderFrequency, ReminderSettings, SettingsPatch,
};
pub use store::{NotificationStore, StoreView};
pub use types::{Notification, NotificationDraft, NotificationId, NotificationKind};

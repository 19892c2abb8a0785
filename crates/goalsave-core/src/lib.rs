//! # GoalSave Core Library
//!
//! Goal progress monitoring and the notification pipeline behind it. A host
//! feeds snapshots of savings goals in; milestone, deadline and achievement
//! evaluators turn changes into events, and every event lands in one
//! persisted, bounded notification log.
//!
//! ## Architecture
//!
//! - **Monitors**: pure evaluators over goal snapshots with persisted
//!   per-goal state, so a threshold or alert is never announced twice
//! - **Notification store**: ordered log, unread count, user settings and
//!   optional platform delivery, persisted after every mutation
//! - **Engine**: wires the evaluators to the store and to subscribers
//! - **Scheduler**: async loop driving the engine from snapshot changes and
//!   interval timers
//! - **Storage**: SQLite key-value persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`MonitorEngine`]: evaluators plus store, built at the composition root
//! - [`NotificationStore`]: the notification log and its settings
//! - [`Scheduler`]: timer and snapshot driven evaluation
//! - [`Database`]: durable key-value storage
//! - [`Config`]: application configuration

pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod goal;
pub mod monitor;
pub mod notification;
pub mod scheduler;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::MonitorEngine;
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::{EventBus, MonitorEvent, SubscriptionId};
pub use goal::{GoalId, GoalSnapshot, SnapshotFeed};
pub use monitor::{
    AchievementKind, DeadlinePolicy, DeadlineTier, GoalProgress, MilestoneTracker, MonitorState,
};
pub use notification::{
    Notification, NotificationDraft, NotificationId, NotificationKind, NotificationSettings,
    NotificationStore, PlatformNotifier, SettingsPatch, StoreView,
};
pub use scheduler::{command_channel, Scheduler, SchedulerConfig, SchedulerHandle, StoreCommand};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};

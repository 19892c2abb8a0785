//! The persisted, ordered notification log.
//!
//! All producers (the three evaluators and ad-hoc error reporting) write
//! through [`NotificationStore::add`]. Mutations never fail: persistence is
//! attempted after every change and any storage error is logged and dropped.
//! Loading is equally total, falling back to an empty log and default
//! settings.

use std::sync::Arc;

use serde::Serialize;

use super::log::{reduce, LogAction, NotificationLog};
use super::platform::{NoopNotifier, PlatformError, PlatformNotifier};
use super::settings::{NotificationSettings, PlatformPermission, SettingsPatch};
use super::types::{Notification, NotificationDraft, NotificationId};
use crate::clock::Clock;
use crate::events::{EventBus, MonitorEvent, SubscriptionId};
use crate::storage::{load_record, save_record, KeyValueStore};

pub const NOTIFICATIONS_KEY: &str = "goalsave-notifications";
pub const SETTINGS_KEY: &str = "goalsave-notification-settings";

/// Default log capacity.
pub const DEFAULT_CAPACITY: usize = 50;

/// Read-only view handed to UI consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreView {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

pub struct NotificationStore {
    log: NotificationLog,
    settings: NotificationSettings,
    capacity: usize,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    notifier: Box<dyn PlatformNotifier>,
    bus: EventBus,
}

impl NotificationStore {
    /// Load the log and settings from `storage`.
    pub fn open(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(storage, clock, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        capacity: usize,
    ) -> Self {
        let capacity = capacity.max(1);
        let log = load_record::<NotificationLog>(storage.as_ref(), NOTIFICATIONS_KEY)
            .unwrap_or_default()
            .normalized(capacity);
        let settings = load_record::<NotificationSettings>(storage.as_ref(), SETTINGS_KEY)
            .unwrap_or_default();
        tracing::debug!(
            entries = log.entries.len(),
            unread = log.unread_count(),
            "notification store loaded"
        );

        Self {
            log,
            settings,
            capacity,
            storage,
            clock,
            notifier: Box::new(NoopNotifier),
            bus: EventBus::new(),
        }
    }

    /// Attach a platform notification channel.
    pub fn with_notifier(mut self, notifier: Box<dyn PlatformNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Most recent first.
    pub fn notifications(&self) -> &[Notification] {
        &self.log.entries
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.log.get(id)
    }

    pub fn unread_count(&self) -> usize {
        self.log.unread_count()
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn view(&self) -> StoreView {
        StoreView {
            notifications: self.log.entries.clone(),
            unread_count: self.log.unread_count(),
        }
    }

    // ── Subscribers ──────────────────────────────────────────────────

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&MonitorEvent) + Send + Sync + 'static,
    {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub(crate) fn emit(&self, event: &MonitorEvent) {
        self.bus.emit(event);
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Append a notification and return its identity.
    pub fn add(&mut self, draft: NotificationDraft) -> NotificationId {
        let id = NotificationId(self.log.next_id);
        let notification = draft.into_notification(id, self.clock.now());
        tracing::info!(
            id = %id,
            kind = notification.kind.as_str(),
            title = %notification.title,
            "notification added"
        );

        if self.settings.platform_delivery_allowed() {
            self.deliver_to_platform(&notification);
        }

        self.apply(LogAction::Add(notification));
        self.emit(&MonitorEvent::NotificationAdded { id });
        id
    }

    /// Route a failure from elsewhere in the system into the log.
    pub fn report_error(&mut self, context: &str, message: impl Into<String>) -> NotificationId {
        self.add(NotificationDraft::warning(context.to_string(), message))
    }

    pub fn mark_as_read(&mut self, id: NotificationId) {
        let unread = self.log.get(id).is_some_and(|n| !n.read);
        if unread {
            self.apply(LogAction::MarkRead(id));
            self.emit(&MonitorEvent::NotificationRead { id });
        }
    }

    pub fn remove_notification(&mut self, id: NotificationId) {
        if self.log.contains(id) {
            self.apply(LogAction::Remove(id));
            self.emit(&MonitorEvent::NotificationRemoved { id });
        }
    }

    pub fn clear_all(&mut self) {
        self.apply(LogAction::ClearAll);
        self.emit(&MonitorEvent::NotificationsCleared);
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) {
        let next = self.settings.merged(patch);
        self.replace_settings(next);
    }

    /// Swap in a full settings value, e.g. one built with
    /// [`NotificationSettings::with_value`].
    pub fn replace_settings(&mut self, settings: NotificationSettings) {
        if settings == self.settings {
            return;
        }
        self.settings = settings;
        save_record(self.storage.as_ref(), SETTINGS_KEY, &self.settings);
        self.emit(&MonitorEvent::SettingsUpdated);
    }

    /// Mirror a permission change reported by the platform.
    pub fn set_permission(&mut self, permission: PlatformPermission) {
        let mut next = self.settings.clone();
        next.platform.permission = permission;
        self.replace_settings(next);
    }

    /// Ask the attached notifier for its permission and mirror it.
    pub fn sync_permission(&mut self) {
        let permission = self.notifier.permission();
        self.set_permission(permission);
    }

    fn apply(&mut self, action: LogAction) {
        let log = std::mem::take(&mut self.log);
        self.log = reduce(log, action, self.capacity);
        save_record(self.storage.as_ref(), NOTIFICATIONS_KEY, &self.log);
    }

    fn deliver_to_platform(&self, notification: &Notification) {
        match self.notifier.show(notification) {
            Ok(()) => {}
            Err(PlatformError::Unsupported) => {
                tracing::debug!(id = %notification.id, "platform notifications unsupported");
            }
            Err(e) => {
                tracing::warn!(id = %notification.id, error = %e, "platform notification failed");
            }
        }
    }
}

impl std::fmt::Debug for NotificationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationStore")
            .field("entries", &self.log.entries.len())
            .field("unread", &self.log.unread_count())
            .field("capacity", &self.capacity)
            .finish()
    }
}

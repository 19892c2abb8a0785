use serde::{Deserialize, Serialize};

use crate::goal::GoalId;
use crate::monitor::{AchievementKind, DeadlineTier};
use crate::notification::NotificationId;

/// Every notification-producing condition and every store mutation
/// produces an Event. The CLI prints them; other consumers subscribe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    MilestoneReached {
        goal_id: GoalId,
        goal_name: String,
        threshold: u32,
        is_complete: bool,
    },
    DeadlineAlert {
        goal_id: GoalId,
        goal_name: String,
        tier: DeadlineTier,
        days_until: i64,
    },
    AchievementUnlocked {
        goal_id: GoalId,
        goal_name: String,
        kind: AchievementKind,
    },
    NotificationAdded {
        id: NotificationId,
    },
    NotificationRead {
        id: NotificationId,
    },
    NotificationRemoved {
        id: NotificationId,
    },
    NotificationsCleared,
    SettingsUpdated,
    GoalReset {
        goal_id: GoalId,
    },
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&MonitorEvent) + Send + Sync>;

/// Fan-out of [`MonitorEvent`]s to any number of independent listeners.
///
/// Listeners are called synchronously, in subscription order.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&MonitorEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&self, event: &MonitorEvent) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

//! Pure transitions over the notification log.
//!
//! [`reduce`] is the only place the log changes shape; the store wraps it
//! with persistence and event emission.

use serde::{Deserialize, Serialize};

use super::types::{Notification, NotificationId};

/// The persisted log: most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationLog {
    /// Next identity to hand out; survives `ClearAll` so ids never repeat.
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub entries: Vec<Notification>,
}

/// A change to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogAction {
    Add(Notification),
    MarkRead(NotificationId),
    Remove(NotificationId),
    ClearAll,
}

impl NotificationLog {
    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.read).count()
    }

    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.entries.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.get(id).is_some()
    }

    /// Repair a loaded log: keep the newest `capacity` entries and make sure
    /// `next_id` is past every id in use.
    pub fn normalized(mut self, capacity: usize) -> Self {
        self.entries.truncate(capacity);
        if let Some(max) = self.entries.iter().map(|n| n.id.0).max() {
            self.next_id = self.next_id.max(max + 1);
        }
        self
    }
}

/// Apply `action` to `state`, keeping at most `capacity` entries.
///
/// Eviction drops the oldest entries regardless of their read or persistent
/// flags.
pub fn reduce(mut state: NotificationLog, action: LogAction, capacity: usize) -> NotificationLog {
    match action {
        LogAction::Add(notification) => {
            state.next_id = state.next_id.max(notification.id.0 + 1);
            state.entries.insert(0, notification);
            state.entries.truncate(capacity);
        }
        LogAction::MarkRead(id) => {
            if let Some(entry) = state.entries.iter_mut().find(|n| n.id == id) {
                entry.read = true;
            }
        }
        LogAction::Remove(id) => {
            state.entries.retain(|n| n.id != id);
        }
        LogAction::ClearAll => {
            state.entries.clear();
        }
    }
    state
}

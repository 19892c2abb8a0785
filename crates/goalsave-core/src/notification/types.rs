use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::goal::GoalId;

/// Identity assigned by the store; strictly increasing in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Milestone,
    Reminder,
    Achievement,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Milestone => "milestone",
            NotificationKind::Reminder => "reminder",
            NotificationKind::Achievement => "achievement",
            NotificationKind::Warning => "warning",
            NotificationKind::Info => "info",
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "milestone" => Ok(NotificationKind::Milestone),
            "reminder" => Ok(NotificationKind::Reminder),
            "achievement" => Ok(NotificationKind::Achievement),
            "warning" => Ok(NotificationKind::Warning),
            "info" => Ok(NotificationKind::Info),
            other => Err(format!("unknown notification kind: {other}")),
        }
    }
}

/// An entry of the notification log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<GoalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    /// Retention hint for the UI; does not protect against log eviction.
    #[serde(default)]
    pub persistent: bool,
}

/// What producers hand to the store; identity, timestamp and read state are
/// filled in by [`crate::notification::NotificationStore::add`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub goal_id: Option<GoalId>,
    #[serde(default)]
    pub goal_name: Option<String>,
    #[serde(default)]
    pub persistent: bool,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            goal_id: None,
            goal_name: None,
            persistent: false,
        }
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, message)
    }

    pub fn for_goal(mut self, goal_id: GoalId, goal_name: impl Into<String>) -> Self {
        self.goal_id = Some(goal_id);
        self.goal_name = Some(goal_name.into());
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub(crate) fn into_notification(self, id: NotificationId, timestamp: DateTime<Utc>) -> Notification {
        Notification {
            id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            goal_id: self.goal_id,
            goal_name: self.goal_name,
            timestamp,
            read: false,
            persistent: self.persistent,
        }
    }
}

//! Goal records as supplied by the snapshot provider.
//!
//! The core never mutates these; they are read at one evaluation instant and
//! dropped afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique goal identifier.
///
/// Accepts either a JSON number or a JSON string on input, since providers
/// backed by on-chain ids tend to hand out numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawGoalId")]
pub struct GoalId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGoalId {
    Number(u64),
    Text(String),
}

impl From<RawGoalId> for GoalId {
    fn from(raw: RawGoalId) -> Self {
        match raw {
            RawGoalId::Number(n) => GoalId(n.to_string()),
            RawGoalId::Text(s) => GoalId(s),
        }
    }
}

impl GoalId {
    pub fn new(id: impl Into<String>) -> Self {
        GoalId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GoalId {
    fn from(s: &str) -> Self {
        GoalId(s.to_string())
    }
}

/// A single savings goal at one evaluation instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSnapshot {
    pub id: GoalId,
    pub name: String,
    /// Target amount; 0 means the percentage is undefined.
    pub target: u64,
    /// Current balance; may exceed `target`.
    pub balance: u64,
    /// Deadline in seconds since epoch; 0 means no deadline.
    #[serde(default, alias = "lockUntil")]
    pub lock_until_epoch: i64,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub archived: bool,
}

impl GoalSnapshot {
    pub fn new(id: impl Into<String>, name: impl Into<String>, target: u64, balance: u64) -> Self {
        Self {
            id: GoalId::new(id),
            name: name.into(),
            target,
            balance,
            lock_until_epoch: 0,
            closed: false,
            archived: false,
        }
    }

    pub fn with_deadline(mut self, lock_until_epoch: i64) -> Self {
        self.lock_until_epoch = lock_until_epoch;
        self
    }

    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    /// Whole percentage of target reached, floored; `None` when `target == 0`.
    ///
    /// Computed in 128-bit integers so the threshold comparison is exact.
    pub fn percentage(&self) -> Option<u64> {
        if self.target == 0 {
            return None;
        }
        let pct = u128::from(self.balance) * 100 / u128::from(self.target);
        Some(u64::try_from(pct).unwrap_or(u64::MAX))
    }

    pub fn is_funded(&self) -> bool {
        self.target > 0 && self.balance >= self.target
    }
}

/// What the snapshot provider currently exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotFeed {
    pub goals: Option<Vec<GoalSnapshot>>,
    pub is_loading: bool,
}

impl SnapshotFeed {
    pub fn loading() -> Self {
        Self {
            goals: None,
            is_loading: true,
        }
    }

    pub fn loaded(goals: Vec<GoalSnapshot>) -> Self {
        Self {
            goals: Some(goals),
            is_loading: false,
        }
    }

    /// Goals ready for evaluation, or `None` while loading or absent.
    pub fn ready(&self) -> Option<&[GoalSnapshot]> {
        if self.is_loading {
            return None;
        }
        self.goals.as_deref()
    }
}

//! One-shot achievements over the whole goal collection.
//!
//! Both grants are sticky: once `first_goal_granted` is set or a goal id is
//! recorded as completed, nothing short of an explicit reset revokes it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::events::MonitorEvent;
use crate::goal::{GoalId, GoalSnapshot};
use crate::notification::{NotificationDraft, NotificationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    FirstGoal,
    GoalCompleted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementState {
    pub first_goal_granted: bool,
    pub completed_goal_ids: BTreeSet<GoalId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementEvent {
    pub kind: AchievementKind,
    pub goal_id: GoalId,
    pub goal_name: String,
}

impl AchievementEvent {
    pub fn to_draft(&self) -> NotificationDraft {
        let (title, message) = match self.kind {
            AchievementKind::FirstGoal => (
                "🏆 First Goal Created!",
                format!(
                    "Welcome to GoalSave! You've created your first goal \"{}\". Keep up the great work!",
                    self.goal_name
                ),
            ),
            AchievementKind::GoalCompleted => (
                "🎊 Goal Master!",
                format!(
                    "Amazing! You've achieved 100% of your goal \"{}\". You're a goal-crushing champion!",
                    self.goal_name
                ),
            ),
        };
        NotificationDraft::new(NotificationKind::Achievement, title, message)
            .for_goal(self.goal_id.clone(), &self.goal_name)
            .persistent(true)
    }

    pub fn to_event(&self) -> MonitorEvent {
        MonitorEvent::AchievementUnlocked {
            goal_id: self.goal_id.clone(),
            goal_name: self.goal_name.clone(),
            kind: self.kind,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AchievementEvaluator {
    state: AchievementState,
}

impl AchievementEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AchievementState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AchievementState {
        &self.state
    }

    pub fn evaluate(&mut self, snapshots: &[GoalSnapshot]) -> Vec<AchievementEvent> {
        let mut events = Vec::new();

        if !self.state.first_goal_granted {
            if let [only] = snapshots {
                if only.balance > 0 {
                    tracing::info!(goal_id = %only.id, "first goal achievement");
                    self.state.first_goal_granted = true;
                    events.push(AchievementEvent {
                        kind: AchievementKind::FirstGoal,
                        goal_id: only.id.clone(),
                        goal_name: only.name.clone(),
                    });
                }
            }
        }

        for goal in snapshots.iter().filter(|g| g.is_funded()) {
            if self.state.completed_goal_ids.insert(goal.id.clone()) {
                tracing::info!(goal_id = %goal.id, "goal completion achievement");
                events.push(AchievementEvent {
                    kind: AchievementKind::GoalCompleted,
                    goal_id: goal.id.clone(),
                    goal_name: goal.name.clone(),
                });
            }
        }
        events
    }

    /// Revoke every grant.
    pub fn reset(&mut self) {
        self.state = AchievementState::default();
    }
}

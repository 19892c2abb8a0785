//! Goal evaluators: milestones, deadlines and achievements.
//!
//! Each evaluator is total over its input and returns plain events; turning
//! them into notifications is the engine's job.

mod achievement;
mod deadline;
mod milestone;

pub use achievement::{AchievementEvaluator, AchievementEvent, AchievementKind, AchievementState};
pub use deadline::{
    days_until, format_countdown, DeadlineEvent, DeadlineMonitor, DeadlinePolicy, DeadlineState,
    DeadlineTier,
};
pub use milestone::{GoalProgress, MilestoneEvent, MilestoneState, MilestoneTracker};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::goal::GoalId;

pub const MONITOR_STATE_KEY: &str = "goalsave-monitor-state";

/// Everything the evaluators remember between passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    #[serde(default)]
    pub milestones: MilestoneTracker,
    #[serde(default)]
    pub deadlines: BTreeMap<GoalId, DeadlineState>,
    #[serde(default)]
    pub achievements: AchievementState,
}

/// Borrowed form of [`MonitorState`] for writing without cloning.
#[derive(Serialize)]
pub(crate) struct MonitorStateRef<'a> {
    pub milestones: &'a MilestoneTracker,
    pub deadlines: &'a BTreeMap<GoalId, DeadlineState>,
    pub achievements: &'a AchievementState,
}

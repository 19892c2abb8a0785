//! Percentage-of-target threshold crossings.
//!
//! Each goal carries a small state machine: the percentage seen at the last
//! evaluation and the set of thresholds already announced.
//!
//! ```text
//! evaluate:  for t in thresholds (ascending):
//!                last < t <= now  and  t not achieved   => fire t, mark achieved
//!            last := now
//! reset:     last := 0, achieved := {}
//! ```
//!
//! `last` is overwritten on every pass, so an unchanged snapshot is a no-op.
//! `achieved` only grows, so falling back below a threshold and rising again
//! never repeats an announcement.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::events::MonitorEvent;
use crate::goal::{GoalId, GoalSnapshot};
use crate::notification::{NotificationDraft, NotificationKind};

/// Per-goal tracking state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneState {
    pub last_percentage: u64,
    pub achieved_thresholds: BTreeSet<u32>,
}

/// A threshold crossed during one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MilestoneEvent {
    pub goal_id: GoalId,
    pub goal_name: String,
    pub threshold: u32,
    pub is_complete: bool,
}

impl MilestoneEvent {
    pub fn to_draft(&self) -> NotificationDraft {
        let (title, message) = if self.is_complete {
            (
                "🎉 Goal Completed!".to_string(),
                format!(
                    "Congratulations! You've successfully completed your goal \"{}\".",
                    self.goal_name
                ),
            )
        } else {
            (
                format!("🎯 {}% Milestone Reached!", self.threshold),
                format!(
                    "Great progress! You've reached {}% of your goal \"{}\".",
                    self.threshold, self.goal_name
                ),
            )
        };
        NotificationDraft::new(NotificationKind::Milestone, title, message)
            .for_goal(self.goal_id.clone(), &self.goal_name)
            .persistent(self.is_complete)
    }

    pub fn to_event(&self) -> MonitorEvent {
        MonitorEvent::MilestoneReached {
            goal_id: self.goal_id.clone(),
            goal_name: self.goal_name.clone(),
            threshold: self.threshold,
            is_complete: self.is_complete,
        }
    }
}

/// Progress summary for one goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalProgress {
    pub goal_id: GoalId,
    pub last_percentage: u64,
    pub achieved_thresholds: Vec<u32>,
    /// Smallest configured threshold not yet achieved.
    pub next_threshold: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MilestoneTracker {
    goals: BTreeMap<GoalId, MilestoneState>,
}

impl MilestoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate every open goal with a non-zero target against
    /// `enabled_thresholds`. Events come out grouped by goal in snapshot
    /// order, thresholds ascending within a goal.
    pub fn evaluate(
        &mut self,
        snapshots: &[GoalSnapshot],
        enabled_thresholds: &[u32],
    ) -> Vec<MilestoneEvent> {
        let mut thresholds = enabled_thresholds.to_vec();
        thresholds.sort_unstable();
        thresholds.dedup();

        let mut events = Vec::new();
        for goal in snapshots {
            if goal.closed {
                continue;
            }
            let Some(percentage) = goal.percentage() else {
                continue;
            };

            let state = self.goals.entry(goal.id.clone()).or_default();
            for &threshold in &thresholds {
                let t = u64::from(threshold);
                if state.last_percentage < t
                    && t <= percentage
                    && !state.achieved_thresholds.contains(&threshold)
                {
                    tracing::info!(goal_id = %goal.id, threshold, percentage, "milestone crossed");
                    events.push(MilestoneEvent {
                        goal_id: goal.id.clone(),
                        goal_name: goal.name.clone(),
                        threshold,
                        is_complete: threshold == 100,
                    });
                    state.achieved_thresholds.insert(threshold);
                }
            }
            state.last_percentage = percentage;
        }
        events
    }

    /// Forget everything about `goal_id`. Returns whether any state existed.
    pub fn reset(&mut self, goal_id: &GoalId) -> bool {
        self.goals.remove(goal_id).is_some()
    }

    pub fn state(&self, goal_id: &GoalId) -> Option<&MilestoneState> {
        self.goals.get(goal_id)
    }

    pub fn progress(&self, goal_id: &GoalId, thresholds: &[u32]) -> Option<GoalProgress> {
        let state = self.goals.get(goal_id)?;
        let next_threshold = thresholds
            .iter()
            .copied()
            .filter(|t| !state.achieved_thresholds.contains(t))
            .min();
        Some(GoalProgress {
            goal_id: goal_id.clone(),
            last_percentage: state.last_percentage,
            achieved_thresholds: state.achieved_thresholds.iter().copied().collect(),
            next_threshold,
        })
    }

    /// Drop state for goals `keep` rejects. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&GoalId) -> bool) -> usize {
        let before = self.goals.len();
        self.goals.retain(|id, _| keep(id));
        before - self.goals.len()
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const THRESHOLDS: [u32; 4] = [25, 50, 75, 100];

    fn goal(balance: u64) -> GoalSnapshot {
        GoalSnapshot::new("1", "Emergency Fund", 1000, balance)
    }

    fn fired(events: &[MilestoneEvent]) -> Vec<u32> {
        events.iter().map(|e| e.threshold).collect()
    }

    #[test]
    fn stepwise_crossings_fire_once_each() {
        let mut tracker = MilestoneTracker::new();
        assert!(tracker.evaluate(&[goal(0)], &THRESHOLDS).is_empty());
        assert_eq!(fired(&tracker.evaluate(&[goal(260)], &THRESHOLDS)), vec![25]);
        assert_eq!(fired(&tracker.evaluate(&[goal(600)], &THRESHOLDS)), vec![50]);

        let last = tracker.evaluate(&[goal(1000)], &THRESHOLDS);
        assert_eq!(fired(&last), vec![75, 100]);
        assert!(!last[0].is_complete);
        assert!(last[1].is_complete);

        assert!(tracker.evaluate(&[goal(1000)], &THRESHOLDS).is_empty());
    }

    #[test]
    fn unchanged_snapshot_is_idempotent() {
        let mut tracker = MilestoneTracker::new();
        let goals = [goal(500), GoalSnapshot::new("2", "Vacation", 2000, 500)];
        assert_eq!(tracker.evaluate(&goals, &THRESHOLDS).len(), 3);
        assert!(tracker.evaluate(&goals, &THRESHOLDS).is_empty());
    }

    #[test]
    fn regression_does_not_refire() {
        let mut tracker = MilestoneTracker::new();
        assert_eq!(fired(&tracker.evaluate(&[goal(600)], &THRESHOLDS)), vec![25, 50]);
        assert!(tracker.evaluate(&[goal(200)], &THRESHOLDS).is_empty());
        assert_eq!(tracker.state(&GoalId::new("1")).unwrap().last_percentage, 20);
        assert!(tracker.evaluate(&[goal(600)], &THRESHOLDS).is_empty());
    }

    #[test]
    fn reset_refires_at_same_percentage() {
        let mut tracker = MilestoneTracker::new();
        tracker.evaluate(&[goal(800)], &THRESHOLDS);
        assert!(tracker.reset(&GoalId::new("1")));
        assert!(!tracker.reset(&GoalId::new("1")));
        assert_eq!(fired(&tracker.evaluate(&[goal(800)], &THRESHOLDS)), vec![25, 50, 75]);
    }

    #[test]
    fn closed_and_zero_target_goals_are_skipped() {
        let mut tracker = MilestoneTracker::new();
        let goals = [
            goal(1000).closed(),
            GoalSnapshot::new("2", "Undefined", 0, 10),
        ];
        assert!(tracker.evaluate(&goals, &THRESHOLDS).is_empty());
        assert!(tracker.is_empty());
    }

    #[test]
    fn unsorted_thresholds_still_fire_ascending() {
        let mut tracker = MilestoneTracker::new();
        let events = tracker.evaluate(&[goal(1000)], &[100, 25, 50]);
        assert_eq!(fired(&events), vec![25, 50, 100]);
    }

    #[test]
    fn overfunded_goal_reports_percentage_above_100() {
        let mut tracker = MilestoneTracker::new();
        tracker.evaluate(&[goal(1500)], &THRESHOLDS);
        let progress = tracker.progress(&GoalId::new("1"), &THRESHOLDS).unwrap();
        assert_eq!(progress.last_percentage, 150);
        assert_eq!(progress.next_threshold, None);
    }

    #[test]
    fn progress_reports_next_threshold() {
        let mut tracker = MilestoneTracker::new();
        tracker.evaluate(&[goal(300)], &THRESHOLDS);
        let progress = tracker.progress(&GoalId::new("1"), &THRESHOLDS).unwrap();
        assert_eq!(progress.achieved_thresholds, vec![25]);
        assert_eq!(progress.next_threshold, Some(50));
        assert!(tracker.progress(&GoalId::new("nope"), &THRESHOLDS).is_none());
    }

    #[test]
    fn drafts_carry_goal_and_completion_flag() {
        let mut tracker = MilestoneTracker::new();
        let events = tracker.evaluate(&[goal(1000)], &[50, 100]);
        let half = events[0].to_draft();
        assert_eq!(half.title, "🎯 50% Milestone Reached!");
        assert!(!half.persistent);
        let done = events[1].to_draft();
        assert_eq!(done.title, "🎉 Goal Completed!");
        assert!(done.persistent);
        assert_eq!(done.goal_name.as_deref(), Some("Emergency Fund"));
    }

    proptest! {
        #[test]
        fn each_threshold_fires_at_most_once(balances in proptest::collection::vec(0u64..2000, 1..20)) {
            let mut tracker = MilestoneTracker::new();
            let mut seen = Vec::new();
            for balance in &balances {
                let events = tracker.evaluate(&[goal(*balance)], &THRESHOLDS);
                let thresholds = fired(&events);
                let mut sorted = thresholds.clone();
                sorted.sort_unstable();
                prop_assert_eq!(&thresholds, &sorted);
                seen.extend(thresholds);
                prop_assert!(tracker.evaluate(&[goal(*balance)], &THRESHOLDS).is_empty());
            }
            let mut unique = seen.clone();
            unique.sort_unstable();
            unique.dedup();
            prop_assert_eq!(seen.len(), unique.len());

            let peak = balances.iter().copied().max().unwrap_or(0) * 100 / 1000;
            let expected: Vec<u32> = THRESHOLDS.iter().copied().filter(|t| u64::from(*t) <= peak).collect();
            let mut all = seen;
            all.sort_unstable();
            prop_assert_eq!(all, expected);
        }
    }
}

//! Deadline urgency with throttled re-alerting.
//!
//! A goal's deadline is bucketed by whole days remaining (floored, so any
//! time past the deadline is day -1 or earlier). Each `(goal, tier)` pair
//! remembers when it last alerted and stays quiet until the throttle window
//! has strictly elapsed. Interval ticks and change-triggered ticks share the
//! same ledger, so they cannot double-fire inside a window.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::events::MonitorEvent;
use crate::goal::{GoalId, GoalSnapshot};
use crate::notification::{NotificationDraft, NotificationKind};
use crate::storage::{DeadlineConfig, MAX_THROTTLE_HOURS};

const SECS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineTier {
    Approaching,
    Urgent,
    Overdue,
}

/// Classification and throttle parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlinePolicy {
    pub urgent_days: i64,
    /// 0 disables the approaching tier.
    pub approaching_days: i64,
    pub throttle: Duration,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self {
            urgent_days: 3,
            approaching_days: 0,
            throttle: Duration::hours(24),
        }
    }
}

impl From<&DeadlineConfig> for DeadlinePolicy {
    fn from(cfg: &DeadlineConfig) -> Self {
        Self {
            urgent_days: cfg.urgent_days.max(0),
            approaching_days: cfg.approaching_days.max(0),
            throttle: Duration::hours(cfg.throttle_hours.clamp(0, MAX_THROTTLE_HOURS)),
        }
    }
}

impl DeadlinePolicy {
    pub fn classify(&self, days_until: i64) -> Option<DeadlineTier> {
        if days_until < 0 {
            Some(DeadlineTier::Overdue)
        } else if days_until <= self.urgent_days {
            Some(DeadlineTier::Urgent)
        } else if days_until <= self.approaching_days {
            Some(DeadlineTier::Approaching)
        } else {
            None
        }
    }
}

/// Last alert time per tier for one goal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approaching: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgent: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overdue: Option<DateTime<Utc>>,
}

impl DeadlineState {
    pub fn last_alert_at(&self, tier: DeadlineTier) -> Option<DateTime<Utc>> {
        match tier {
            DeadlineTier::Approaching => self.approaching,
            DeadlineTier::Urgent => self.urgent,
            DeadlineTier::Overdue => self.overdue,
        }
    }

    fn record(&mut self, tier: DeadlineTier, at: DateTime<Utc>) {
        let slot = match tier {
            DeadlineTier::Approaching => &mut self.approaching,
            DeadlineTier::Urgent => &mut self.urgent,
            DeadlineTier::Overdue => &mut self.overdue,
        };
        *slot = Some(at);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineEvent {
    pub goal_id: GoalId,
    pub goal_name: String,
    pub tier: DeadlineTier,
    pub days_until: i64,
}

impl DeadlineEvent {
    pub fn to_draft(&self) -> NotificationDraft {
        let countdown = format_countdown(self.days_until);
        let (kind, title) = match self.tier {
            DeadlineTier::Overdue => (
                NotificationKind::Warning,
                format!("Overdue Deadline: {}", self.goal_name),
            ),
            DeadlineTier::Urgent => (
                NotificationKind::Reminder,
                format!("Urgent Deadline: {}", self.goal_name),
            ),
            DeadlineTier::Approaching => (
                NotificationKind::Info,
                format!("Deadline Reminder: {}", self.goal_name),
            ),
        };
        let message = match self.tier {
            DeadlineTier::Overdue => format!("Goal deadline has passed: {countdown}"),
            _ => format!("Goal deadline is approaching: {countdown}"),
        };
        NotificationDraft::new(kind, title, message).for_goal(self.goal_id.clone(), &self.goal_name)
    }

    pub fn to_event(&self) -> MonitorEvent {
        MonitorEvent::DeadlineAlert {
            goal_id: self.goal_id.clone(),
            goal_name: self.goal_name.clone(),
            tier: self.tier,
            days_until: self.days_until,
        }
    }
}

/// Whole days from `now` until `deadline`, floored.
pub fn days_until(deadline_epoch: i64, now_epoch: i64) -> i64 {
    deadline_epoch.saturating_sub(now_epoch).div_euclid(SECS_PER_DAY)
}

/// Human countdown, e.g. "Due tomorrow" or "Overdue by 2 days".
pub fn format_countdown(days: i64) -> String {
    match days {
        d if d < 0 => {
            let n = d.unsigned_abs();
            format!("Overdue by {n} day{}", if n == 1 { "" } else { "s" })
        }
        0 => "Due today".to_string(),
        1 => "Due tomorrow".to_string(),
        d => format!("{d} days remaining"),
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeadlineMonitor {
    policy: DeadlinePolicy,
    goals: BTreeMap<GoalId, DeadlineState>,
}

impl DeadlineMonitor {
    pub fn new(policy: DeadlinePolicy) -> Self {
        Self {
            policy,
            goals: BTreeMap::new(),
        }
    }

    /// Resume with previously persisted per-goal state.
    pub fn with_state(mut self, goals: BTreeMap<GoalId, DeadlineState>) -> Self {
        self.goals = goals;
        self
    }

    pub fn policy(&self) -> &DeadlinePolicy {
        &self.policy
    }

    pub fn states(&self) -> &BTreeMap<GoalId, DeadlineState> {
        &self.goals
    }

    pub fn state(&self, goal_id: &GoalId) -> Option<&DeadlineState> {
        self.goals.get(goal_id)
    }

    pub fn evaluate(&mut self, snapshots: &[GoalSnapshot], now: DateTime<Utc>) -> Vec<DeadlineEvent> {
        let now_epoch = now.timestamp();
        let mut events = Vec::new();

        for goal in snapshots {
            if goal.closed || goal.archived || goal.lock_until_epoch == 0 {
                continue;
            }
            let days = days_until(goal.lock_until_epoch, now_epoch);
            let Some(tier) = self.policy.classify(days) else {
                continue;
            };

            let state = self.goals.entry(goal.id.clone()).or_default();
            let throttled = state
                .last_alert_at(tier)
                .is_some_and(|last| now - last <= self.policy.throttle);
            if throttled {
                tracing::debug!(goal_id = %goal.id, ?tier, "deadline alert throttled");
                continue;
            }

            tracing::info!(goal_id = %goal.id, ?tier, days_until = days, "deadline alert");
            state.record(tier, now);
            events.push(DeadlineEvent {
                goal_id: goal.id.clone(),
                goal_name: goal.name.clone(),
                tier,
                days_until: days,
            });
        }
        events
    }

    /// Drop state for goals `keep` rejects. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&GoalId) -> bool) -> usize {
        let before = self.goals.len();
        self.goals.retain(|id, _| keep(id));
        before - self.goals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn goal_due_in(secs: i64) -> GoalSnapshot {
        GoalSnapshot::new("g", "House", 1000, 10).with_deadline(NOW + secs)
    }

    #[test]
    fn policy_from_config_clamps_throttle() {
        let huge = DeadlineConfig {
            throttle_hours: 9_000_000_000_000_000,
            ..DeadlineConfig::default()
        };
        assert_eq!(
            DeadlinePolicy::from(&huge).throttle,
            Duration::hours(MAX_THROTTLE_HOURS)
        );

        let negative = DeadlineConfig {
            throttle_hours: -5,
            ..DeadlineConfig::default()
        };
        assert_eq!(DeadlinePolicy::from(&negative).throttle, Duration::zero());
    }

    #[test]
    fn days_until_floors_toward_negative() {
        assert_eq!(days_until(NOW + 86_400 * 3 + 5, NOW), 3);
        assert_eq!(days_until(NOW + 10, NOW), 0);
        assert_eq!(days_until(NOW - 1, NOW), -1);
        assert_eq!(days_until(NOW - 86_400, NOW), -1);
        assert_eq!(days_until(NOW - 86_401, NOW), -2);
    }

    #[test]
    fn classification_boundaries() {
        let policy = DeadlinePolicy::default();
        assert_eq!(policy.classify(-1), Some(DeadlineTier::Overdue));
        assert_eq!(policy.classify(0), Some(DeadlineTier::Urgent));
        assert_eq!(policy.classify(3), Some(DeadlineTier::Urgent));
        assert_eq!(policy.classify(4), None);

        let policy = DeadlinePolicy {
            approaching_days: 7,
            ..Default::default()
        };
        assert_eq!(policy.classify(7), Some(DeadlineTier::Approaching));
        assert_eq!(policy.classify(8), None);
    }

    #[test]
    fn overdue_alert_is_throttled_for_24h() {
        let mut monitor = DeadlineMonitor::new(DeadlinePolicy::default());
        let goals = [goal_due_in(-3600)];

        assert_eq!(monitor.evaluate(&goals, at(NOW)).len(), 1);
        assert!(monitor.evaluate(&goals, at(NOW + 3600)).is_empty());
        assert!(monitor.evaluate(&goals, at(NOW + 86_400)).is_empty());

        let again = monitor.evaluate(&goals, at(NOW + 86_401));
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].tier, DeadlineTier::Overdue);
    }

    #[test]
    fn tiers_throttle_independently() {
        let mut monitor = DeadlineMonitor::new(DeadlinePolicy::default());
        let goal = GoalSnapshot::new("g", "House", 1000, 10).with_deadline(NOW + 3600);

        let first = monitor.evaluate(std::slice::from_ref(&goal), at(NOW));
        assert_eq!(first[0].tier, DeadlineTier::Urgent);

        let later = monitor.evaluate(std::slice::from_ref(&goal), at(NOW + 7200));
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].tier, DeadlineTier::Overdue);
        assert_eq!(later[0].days_until, -1);
    }

    #[test]
    fn skipped_goals() {
        let mut monitor = DeadlineMonitor::new(DeadlinePolicy::default());
        let goals = [
            GoalSnapshot::new("a", "No deadline", 100, 0),
            goal_due_in(60).closed(),
            goal_due_in(60).archived(),
            goal_due_in(86_400 * 30),
        ];
        assert!(monitor.evaluate(&goals, at(NOW)).is_empty());
        assert!(monitor.states().is_empty());
    }

    #[test]
    fn negative_epochs_degrade_to_overdue() {
        let mut monitor = DeadlineMonitor::new(DeadlinePolicy::default());
        let goal = GoalSnapshot::new("g", "Ancient", 1, 0).with_deadline(-5);
        let events = monitor.evaluate(&[goal], at(NOW));
        assert_eq!(events[0].tier, DeadlineTier::Overdue);
    }

    #[test]
    fn countdown_text() {
        assert_eq!(format_countdown(-1), "Overdue by 1 day");
        assert_eq!(format_countdown(-4), "Overdue by 4 days");
        assert_eq!(format_countdown(0), "Due today");
        assert_eq!(format_countdown(1), "Due tomorrow");
        assert_eq!(format_countdown(6), "6 days remaining");
    }

    #[test]
    fn drafts_map_tier_to_kind() {
        let event = DeadlineEvent {
            goal_id: GoalId::new("g"),
            goal_name: "House".into(),
            tier: DeadlineTier::Urgent,
            days_until: 1,
        };
        let draft = event.to_draft();
        assert_eq!(draft.kind, NotificationKind::Reminder);
        assert_eq!(draft.title, "Urgent Deadline: House");
        assert_eq!(draft.message, "Goal deadline is approaching: Due tomorrow");

        let overdue = DeadlineEvent {
            tier: DeadlineTier::Overdue,
            days_until: -2,
            ..event
        };
        assert_eq!(overdue.to_draft().kind, NotificationKind::Warning);
    }
}

//! Monitor engine: the three evaluators wired to one notification store.
//!
//! Built once at the composition root with explicit clock and storage ports.
//! Each `evaluate_*` call runs one evaluator over a snapshot, publishes every
//! resulting event to subscribers and to the store in the order produced, and
//! persists the evaluator state so a later process resumes where this one
//! stopped.

use std::collections::HashSet;
use std::sync::Arc;

use crate::clock::Clock;
use crate::events::{MonitorEvent, SubscriptionId};
use crate::goal::{GoalId, GoalSnapshot};
use crate::monitor::{
    AchievementEvaluator, DeadlineMonitor, DeadlinePolicy, GoalProgress, MilestoneTracker,
    MonitorState, MonitorStateRef, MONITOR_STATE_KEY,
};
use crate::notification::{NotificationDraft, NotificationStore};
use crate::storage::{load_record, save_record, Config, KeyValueStore};

pub struct MonitorEngine {
    store: NotificationStore,
    clock: Arc<dyn Clock>,
    storage: Arc<dyn KeyValueStore>,
    milestones: MilestoneTracker,
    deadlines: DeadlineMonitor,
    achievements: AchievementEvaluator,
}

impl MonitorEngine {
    /// Assemble an engine around an already opened store, restoring any
    /// persisted evaluator state from `storage`.
    pub fn new(
        store: NotificationStore,
        clock: Arc<dyn Clock>,
        storage: Arc<dyn KeyValueStore>,
        policy: DeadlinePolicy,
    ) -> Self {
        let state: MonitorState =
            load_record(storage.as_ref(), MONITOR_STATE_KEY).unwrap_or_default();
        tracing::debug!(
            milestone_goals = state.milestones.len(),
            deadline_goals = state.deadlines.len(),
            "monitor state restored"
        );

        Self {
            store,
            clock,
            storage,
            milestones: state.milestones,
            deadlines: DeadlineMonitor::new(policy).with_state(state.deadlines),
            achievements: AchievementEvaluator::with_state(state.achievements),
        }
    }

    /// Open store and engine from one storage port using `config`.
    pub fn open(storage: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        let store = NotificationStore::with_capacity(
            storage.clone(),
            clock.clone(),
            config.store.max_notifications,
        );
        Self::new(store, clock, storage, DeadlinePolicy::from(&config.deadlines))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NotificationStore {
        &mut self.store
    }

    pub fn milestones(&self) -> &MilestoneTracker {
        &self.milestones
    }

    pub fn deadlines(&self) -> &DeadlineMonitor {
        &self.deadlines
    }

    pub fn achievements(&self) -> &AchievementEvaluator {
        &self.achievements
    }

    pub fn goal_progress(&self, goal_id: &GoalId) -> Option<GoalProgress> {
        let thresholds = self.store.settings().enabled_thresholds();
        self.milestones.progress(goal_id, &thresholds)
    }

    // ── Subscribers ──────────────────────────────────────────────────

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&MonitorEvent) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    // ── Evaluation ───────────────────────────────────────────────────

    pub fn evaluate_milestones(&mut self, goals: &[GoalSnapshot]) -> Vec<MonitorEvent> {
        let events = self.run_milestones(goals);
        self.save_state();
        events
    }

    pub fn evaluate_deadlines(&mut self, goals: &[GoalSnapshot]) -> Vec<MonitorEvent> {
        let events = self.run_deadlines(goals);
        self.save_state();
        events
    }

    pub fn evaluate_achievements(&mut self, goals: &[GoalSnapshot]) -> Vec<MonitorEvent> {
        let events = self.run_achievements(goals);
        self.save_state();
        events
    }

    /// Milestones, then achievements, then deadlines, persisted once.
    pub fn evaluate_all(&mut self, goals: &[GoalSnapshot]) -> Vec<MonitorEvent> {
        let mut events = self.run_milestones(goals);
        events.extend(self.run_achievements(goals));
        events.extend(self.run_deadlines(goals));
        self.save_state();
        events
    }

    /// Clear milestone state for one goal so its thresholds can fire again.
    pub fn reset_goal(&mut self, goal_id: &GoalId) -> bool {
        let existed = self.milestones.reset(goal_id);
        self.save_state();
        self.store.emit(&MonitorEvent::GoalReset {
            goal_id: goal_id.clone(),
        });
        existed
    }

    /// Drop per-goal tracking for goals that left the snapshot, and deadline
    /// tracking for goals that were closed or archived. An empty snapshot
    /// prunes nothing. Achievement grants are never pruned.
    pub fn prune(&mut self, goals: &[GoalSnapshot]) -> usize {
        if goals.is_empty() {
            return 0;
        }
        let present: HashSet<&GoalId> = goals.iter().map(|g| &g.id).collect();
        let active: HashSet<&GoalId> = goals
            .iter()
            .filter(|g| !g.closed && !g.archived)
            .map(|g| &g.id)
            .collect();

        let dropped = self.milestones.retain(|id| present.contains(id))
            + self.deadlines.retain(|id| active.contains(id));
        if dropped > 0 {
            tracing::debug!(dropped, "pruned tracking state for departed goals");
        }
        dropped
    }

    fn run_milestones(&mut self, goals: &[GoalSnapshot]) -> Vec<MonitorEvent> {
        self.prune(goals);
        let thresholds = self.store.settings().enabled_thresholds();
        let found = self.milestones.evaluate(goals, &thresholds);
        tracing::debug!(goals = goals.len(), fired = found.len(), "milestone pass");
        found
            .iter()
            .map(|e| self.publish(e.to_event(), e.to_draft()))
            .collect()
    }

    fn run_deadlines(&mut self, goals: &[GoalSnapshot]) -> Vec<MonitorEvent> {
        self.prune(goals);
        if !self.store.settings().reminders.enabled {
            tracing::debug!("deadline reminders disabled");
            return Vec::new();
        }
        let found = self.deadlines.evaluate(goals, self.clock.now());
        tracing::debug!(goals = goals.len(), fired = found.len(), "deadline pass");
        found
            .iter()
            .map(|e| self.publish(e.to_event(), e.to_draft()))
            .collect()
    }

    fn run_achievements(&mut self, goals: &[GoalSnapshot]) -> Vec<MonitorEvent> {
        let found = self.achievements.evaluate(goals);
        tracing::debug!(goals = goals.len(), fired = found.len(), "achievement pass");
        let settings = self.store.settings();
        let allowed: Vec<_> = found
            .iter()
            .filter(|e| settings.allows_achievement(e.kind))
            .collect();
        allowed
            .into_iter()
            .map(|e| self.publish(e.to_event(), e.to_draft()))
            .collect()
    }

    fn publish(&mut self, event: MonitorEvent, draft: NotificationDraft) -> MonitorEvent {
        self.store.emit(&event);
        self.store.add(draft);
        event
    }

    fn save_state(&self) {
        let state = MonitorStateRef {
            milestones: &self.milestones,
            deadlines: self.deadlines.states(),
            achievements: self.achievements.state(),
        };
        save_record(self.storage.as_ref(), MONITOR_STATE_KEY, &state);
    }
}

impl std::fmt::Debug for MonitorEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorEngine")
            .field("store", &self.store)
            .field("milestone_goals", &self.milestones.len())
            .field("deadline_goals", &self.deadlines.states().len())
            .finish()
    }
}

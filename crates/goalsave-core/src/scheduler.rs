//! Drives the engine from snapshot changes and interval timers.
//!
//! The scheduler owns the [`MonitorEngine`] for as long as it runs and is the
//! only thing that touches it: snapshot changes, timer ticks and store
//! commands from UI consumers are all handled on the one loop, one at a time.
//!
//! ## Triggers
//!
//! - A changed snapshot (including the loading -> loaded transition) runs
//!   every evaluator immediately.
//! - The milestone timer (default 30s) runs milestones and achievements.
//! - The deadline timer (default 3600s) runs deadlines.
//!
//! An interval tick is skipped when less than its own interval has passed
//! since that evaluator last ran, whichever trigger ran it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::engine::MonitorEngine;
use crate::goal::{GoalId, GoalSnapshot, SnapshotFeed};
use crate::notification::{NotificationDraft, NotificationId, SettingsPatch, StoreView};
use crate::storage::{SchedulerConfigSection, MAX_INTERVAL_SECS};

/// Timer intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub milestone_interval: Duration,
    pub deadline_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            milestone_interval: Duration::from_secs(30),
            deadline_interval: Duration::from_secs(3600),
        }
    }
}

impl SchedulerConfig {
    /// Both intervals limited to `1s..=MAX_INTERVAL_SECS`, so timer deadlines
    /// never overflow.
    pub fn clamped(self) -> Self {
        let clamp =
            |d: Duration| d.clamp(Duration::from_secs(1), Duration::from_secs(MAX_INTERVAL_SECS));
        Self {
            milestone_interval: clamp(self.milestone_interval),
            deadline_interval: clamp(self.deadline_interval),
        }
    }
}

impl From<&SchedulerConfigSection> for SchedulerConfig {
    fn from(cfg: &SchedulerConfigSection) -> Self {
        Self {
            milestone_interval: cfg.milestone_interval(),
            deadline_interval: cfg.deadline_interval(),
        }
    }
}

/// Coalesces interval ticks against the last run of one evaluator.
#[derive(Debug, Clone)]
pub struct TickGate {
    interval: Duration,
    last_run: Option<Instant>,
}

impl TickGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    pub fn should_run(&self, now: Instant) -> bool {
        self.last_run
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    pub fn record(&mut self, now: Instant) {
        self.last_run = Some(now);
    }

    pub fn last_run(&self) -> Option<Instant> {
        self.last_run
    }
}

/// Requests from UI consumers, applied on the scheduler loop.
#[derive(Debug)]
pub enum StoreCommand {
    Add(NotificationDraft),
    MarkAsRead(NotificationId),
    Remove(NotificationId),
    ClearAll,
    UpdateSettings(SettingsPatch),
    ResetGoal(GoalId),
    View(oneshot::Sender<StoreView>),
}

/// Sending half of the command channel.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<StoreCommand>,
}

/// Receiving half, handed to [`Scheduler::run`].
pub type CommandReceiver = mpsc::UnboundedReceiver<StoreCommand>;

pub fn command_channel() -> (SchedulerHandle, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SchedulerHandle { commands: tx }, rx)
}

impl SchedulerHandle {
    /// Returns false once the scheduler has shut down.
    pub fn send(&self, command: StoreCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn add_notification(&self, draft: NotificationDraft) -> bool {
        self.send(StoreCommand::Add(draft))
    }

    pub fn mark_as_read(&self, id: NotificationId) -> bool {
        self.send(StoreCommand::MarkAsRead(id))
    }

    pub fn remove_notification(&self, id: NotificationId) -> bool {
        self.send(StoreCommand::Remove(id))
    }

    pub fn clear_all(&self) -> bool {
        self.send(StoreCommand::ClearAll)
    }

    pub fn update_settings(&self, patch: SettingsPatch) -> bool {
        self.send(StoreCommand::UpdateSettings(patch))
    }

    pub fn reset_goal(&self, goal_id: GoalId) -> bool {
        self.send(StoreCommand::ResetGoal(goal_id))
    }

    /// Current notifications and unread count, or `None` after shutdown.
    pub async fn view(&self) -> Option<StoreView> {
        let (tx, rx) = oneshot::channel();
        if !self.send(StoreCommand::View(tx)) {
            return None;
        }
        rx.await.ok()
    }
}

pub struct Scheduler {
    engine: MonitorEngine,
    config: SchedulerConfig,
    milestone_gate: TickGate,
    deadline_gate: TickGate,
    current: SnapshotFeed,
}

impl Scheduler {
    pub fn new(engine: MonitorEngine, config: SchedulerConfig) -> Self {
        let config = config.clamped();
        Self {
            engine,
            milestone_gate: TickGate::new(config.milestone_interval),
            deadline_gate: TickGate::new(config.deadline_interval),
            config,
            current: SnapshotFeed::loading(),
        }
    }

    pub fn engine(&self) -> &MonitorEngine {
        &self.engine
    }

    /// Run until `shutdown` resolves, then hand the engine back.
    ///
    /// Work already started when shutdown resolves is finished; nothing is
    /// evaluated afterwards and both timers are dropped.
    pub async fn run<S>(
        mut self,
        mut feed: watch::Receiver<SnapshotFeed>,
        mut commands: CommandReceiver,
        shutdown: S,
    ) -> MonitorEngine
    where
        S: Future<Output = ()>,
    {
        let start = Instant::now();
        let mut milestone_timer = interval_at(
            start + self.config.milestone_interval,
            self.config.milestone_interval,
        );
        milestone_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut deadline_timer = interval_at(
            start + self.config.deadline_interval,
            self.config.deadline_interval,
        );
        deadline_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let initial = feed.borrow_and_update().clone();
        self.on_feed(initial);

        let mut feed_open = true;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("scheduler shutting down");
                    break;
                }
                changed = feed.changed(), if feed_open => {
                    match changed {
                        Ok(()) => {
                            let next = feed.borrow_and_update().clone();
                            self.on_feed(next);
                        }
                        Err(_) => {
                            tracing::debug!("snapshot provider went away");
                            feed_open = false;
                        }
                    }
                }
                Some(command) = commands.recv() => {
                    self.on_command(command);
                }
                _ = milestone_timer.tick() => {
                    self.on_milestone_tick(Instant::now());
                }
                _ = deadline_timer.tick() => {
                    self.on_deadline_tick(Instant::now());
                }
            }
        }

        self.engine
    }

    fn ready_goals(&self) -> Option<Vec<GoalSnapshot>> {
        self.current.ready().map(<[GoalSnapshot]>::to_vec)
    }

    fn on_feed(&mut self, next: SnapshotFeed) {
        if next == self.current {
            return;
        }
        self.current = next;
        let Some(goals) = self.ready_goals() else {
            tracing::debug!("snapshot loading, evaluation deferred");
            return;
        };

        let now = Instant::now();
        let events = self.engine.evaluate_all(&goals);
        self.milestone_gate.record(now);
        self.deadline_gate.record(now);
        tracing::debug!(goals = goals.len(), events = events.len(), "snapshot change evaluated");
    }

    fn on_milestone_tick(&mut self, now: Instant) {
        if !self.milestone_gate.should_run(now) {
            tracing::trace!("milestone tick coalesced");
            return;
        }
        let Some(goals) = self.ready_goals() else {
            return;
        };
        self.engine.evaluate_milestones(&goals);
        self.engine.evaluate_achievements(&goals);
        self.milestone_gate.record(now);
    }

    fn on_deadline_tick(&mut self, now: Instant) {
        if !self.deadline_gate.should_run(now) {
            tracing::trace!("deadline tick coalesced");
            return;
        }
        let Some(goals) = self.ready_goals() else {
            return;
        };
        self.engine.evaluate_deadlines(&goals);
        self.deadline_gate.record(now);
    }

    fn on_command(&mut self, command: StoreCommand) {
        if let StoreCommand::ResetGoal(goal_id) = &command {
            self.engine.reset_goal(goal_id);
            return;
        }
        let store = self.engine.store_mut();
        match command {
            StoreCommand::Add(draft) => {
                store.add(draft);
            }
            StoreCommand::MarkAsRead(id) => store.mark_as_read(id),
            StoreCommand::Remove(id) => store.remove_notification(id),
            StoreCommand::ClearAll => store.clear_all(),
            StoreCommand::UpdateSettings(patch) => store.update_settings(patch),
            StoreCommand::View(reply) => {
                let _ = reply.send(store.view());
            }
            StoreCommand::ResetGoal(_) => {}
        }
    }
}

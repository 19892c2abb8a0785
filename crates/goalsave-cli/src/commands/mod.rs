pub mod check;
pub mod config;
pub mod notifications;
pub mod progress;
pub mod settings;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use goalsave_core::monitor::DeadlinePolicy;
use goalsave_core::{
    Clock, Config, Database, GoalSnapshot, KeyValueStore, MonitorEngine, Notification,
    NotificationStore, SystemClock,
};

use crate::notifier::TerminalNotifier;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Engine over the on-disk database with the terminal as platform channel.
pub fn open_engine(config: &Config) -> CliResult<MonitorEngine> {
    let storage: Arc<dyn KeyValueStore> = Arc::new(Database::open()?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut store =
        NotificationStore::with_capacity(storage.clone(), clock.clone(), config.store.max_notifications)
            .with_notifier(Box::new(TerminalNotifier));
    store.sync_permission();
    Ok(MonitorEngine::new(
        store,
        clock,
        storage,
        DeadlinePolicy::from(&config.deadlines),
    ))
}

/// Read a goals file: a JSON array of goal records.
pub fn load_goals(path: &Path) -> CliResult<Vec<GoalSnapshot>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read goals file {}: {e}", path.display()))?;
    let goals = serde_json::from_str(&content)
        .map_err(|e| format!("invalid goals file {}: {e}", path.display()))?;
    Ok(goals)
}

pub fn print_notification(n: &Notification) {
    let marker = if n.read { ' ' } else { '*' };
    let goal = n
        .goal_name
        .as_deref()
        .map(|name| format!(" ({name})"))
        .unwrap_or_default();
    println!(
        "{marker} #{} [{}] {}{goal}: {}",
        n.id,
        n.kind.as_str(),
        n.title,
        n.message
    );
}

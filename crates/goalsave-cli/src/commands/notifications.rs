use clap::Subcommand;
use goalsave_core::{Config, GoalId, NotificationDraft, NotificationId, NotificationKind};

use super::{open_engine, print_notification, CliResult};

#[derive(Subcommand)]
pub enum NotificationsAction {
    /// List notifications, newest first
    List {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a notification as read
    Read { id: u64 },
    /// Remove one notification
    Remove { id: u64 },
    /// Remove every notification
    Clear,
    /// Add a notification by hand
    Add {
        /// milestone, reminder, achievement, warning or info
        #[arg(long)]
        kind: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        message: String,
        #[arg(long)]
        goal_id: Option<String>,
        #[arg(long)]
        goal_name: Option<String>,
        /// Keep until dismissed explicitly
        #[arg(long)]
        persistent: bool,
    },
}

pub fn run(action: NotificationsAction, config: &Config) -> CliResult {
    let mut engine = open_engine(config)?;
    let store = engine.store_mut();

    match action {
        NotificationsAction::List { unread, json } => {
            let view = store.view();
            let shown: Vec<_> = view
                .notifications
                .iter()
                .filter(|n| !unread || !n.read)
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("{} notification(s), {} unread", view.notifications.len(), view.unread_count);
                shown.into_iter().for_each(print_notification);
            }
        }
        NotificationsAction::Read { id } => {
            let id = NotificationId(id);
            if store.get(id).is_none() {
                return Err(format!("no notification #{id}").into());
            }
            store.mark_as_read(id);
            println!("ok");
        }
        NotificationsAction::Remove { id } => {
            let id = NotificationId(id);
            if store.get(id).is_none() {
                return Err(format!("no notification #{id}").into());
            }
            store.remove_notification(id);
            println!("ok");
        }
        NotificationsAction::Clear => {
            store.clear_all();
            println!("ok");
        }
        NotificationsAction::Add {
            kind,
            title,
            message,
            goal_id,
            goal_name,
            persistent,
        } => {
            let kind: NotificationKind = match kind.parse() {
                Ok(kind) => kind,
                Err(e) => {
                    store.report_error("Notification rejected", format!("{e}"));
                    return Err(e.into());
                }
            };
            let mut draft = NotificationDraft::new(kind, title, message).persistent(persistent);
            if let Some(goal_id) = goal_id {
                let name = goal_name.unwrap_or_else(|| goal_id.clone());
                draft = draft.for_goal(GoalId::new(goal_id), name);
            }
            let id = store.add(draft);
            println!("{id}");
        }
    }
    Ok(())
}

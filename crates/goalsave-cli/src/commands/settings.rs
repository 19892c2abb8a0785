use clap::Subcommand;
use goalsave_core::Config;

use super::{open_engine, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print all notification settings as JSON
    Show,
    /// Get one setting (e.g. "reminders.enabled", "platform.permission")
    Get { key: String },
    /// Set one setting; list and object values are given as JSON
    Set { key: String, value: String },
}

pub fn run(action: SettingsAction, config: &Config) -> CliResult {
    let mut engine = open_engine(config)?;
    let store = engine.store_mut();

    match action {
        SettingsAction::Show => {
            println!("{}", serde_json::to_string_pretty(store.settings())?);
        }
        SettingsAction::Get { key } => match store.settings().get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        SettingsAction::Set { key, value } => {
            let next = store.settings().with_value(&key, &value)?;
            store.replace_settings(next);
            println!("ok");
        }
    }
    Ok(())
}

use std::path::PathBuf;

use clap::Args;
use goalsave_core::Config;

use super::{load_goals, open_engine, print_notification, CliResult};

#[derive(Args)]
pub struct CheckArgs {
    /// JSON array of goal records
    #[arg(long)]
    pub goals: PathBuf,
    /// Print new notifications as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: CheckArgs, config: &Config) -> CliResult {
    let goals = load_goals(&args.goals)?;
    let mut engine = open_engine(config)?;
    let events = engine.evaluate_all(&goals);

    // Every event added exactly one entry, newest first.
    let mut added: Vec<_> = engine
        .store()
        .notifications()
        .iter()
        .take(events.len())
        .cloned()
        .collect();
    added.reverse();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&added)?);
    } else if added.is_empty() {
        println!("no new notifications");
    } else {
        added.iter().for_each(print_notification);
    }
    Ok(())
}

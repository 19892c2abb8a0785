use std::path::PathBuf;

use clap::Args;
use goalsave_core::{Config, GoalId};
use serde::Serialize;

use super::{load_goals, open_engine, CliResult};

#[derive(Args)]
pub struct ProgressArgs {
    pub goal_id: String,
    /// Goals file to read the current percentage from
    #[arg(long)]
    pub goals: Option<PathBuf>,
}

#[derive(Args)]
pub struct ResetArgs {
    pub goal_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressReport {
    goal_id: GoalId,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_percentage: Option<u64>,
    last_percentage: Option<u64>,
    achieved_thresholds: Vec<u32>,
    next_threshold: Option<u32>,
}

pub fn run(args: ProgressArgs, config: &Config) -> CliResult {
    let goal_id = GoalId::new(args.goal_id);
    let current_percentage = match &args.goals {
        Some(path) => {
            let goals = load_goals(path)?;
            let goal = goals
                .iter()
                .find(|g| g.id == goal_id)
                .ok_or_else(|| format!("goal {goal_id} not in {}", path.display()))?;
            goal.percentage()
        }
        None => None,
    };

    let engine = open_engine(config)?;
    let report = match engine.goal_progress(&goal_id) {
        Some(p) => ProgressReport {
            goal_id: p.goal_id,
            current_percentage,
            last_percentage: Some(p.last_percentage),
            achieved_thresholds: p.achieved_thresholds,
            next_threshold: p.next_threshold,
        },
        None => ProgressReport {
            next_threshold: engine.store().settings().enabled_thresholds().first().copied(),
            goal_id,
            current_percentage,
            last_percentage: None,
            achieved_thresholds: Vec::new(),
        },
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn reset(args: ResetArgs, config: &Config) -> CliResult {
    let mut engine = open_engine(config)?;
    let goal_id = GoalId::new(args.goal_id);
    if engine.reset_goal(&goal_id) {
        println!("ok");
    } else {
        println!("no progress recorded for goal {goal_id}");
    }
    Ok(())
}

use std::path::PathBuf;

use clap::Args;
use goalsave_core::{command_channel, Config, Scheduler, SchedulerConfig, SnapshotFeed};
use tokio::sync::watch;

use super::{load_goals, open_engine, CliResult};

#[derive(Args)]
pub struct WatchArgs {
    /// JSON array of goal records, re-read every poll interval
    #[arg(long)]
    pub goals: PathBuf,
}

pub fn run(args: WatchArgs, config: &Config) -> CliResult {
    let mut engine = open_engine(config)?;
    engine.subscribe(|event| match serde_json::to_string(event) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "cannot serialize event"),
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let poll_interval = config.scheduler.poll_interval();
    let scheduler = Scheduler::new(engine, SchedulerConfig::from(&config.scheduler));

    runtime.block_on(async move {
        let (feed_tx, feed_rx) = watch::channel(SnapshotFeed::loading());
        let (_handle, commands) = command_channel();

        let path = args.goals.clone();
        let poller = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            let mut last_error: Option<String> = None;
            loop {
                ticker.tick().await;
                match load_goals(&path).map_err(|e| e.to_string()) {
                    Ok(goals) => {
                        last_error = None;
                        feed_tx.send_if_modified(|feed| {
                            let next = SnapshotFeed::loaded(goals);
                            let changed = *feed != next;
                            *feed = next;
                            changed
                        });
                    }
                    Err(message) => {
                        if last_error.as_deref() != Some(message.as_str()) {
                            tracing::warn!(error = %message, "goals file unavailable");
                            last_error = Some(message);
                        }
                    }
                }
            }
        });

        tracing::info!(goals = %args.goals.display(), "watching");
        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };
        let engine = scheduler.run(feed_rx, commands, shutdown).await;
        poller.abort();
        tracing::info!(unread = engine.store().unread_count(), "stopped");
    });
    Ok(())
}

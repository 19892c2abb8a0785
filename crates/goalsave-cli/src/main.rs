use clap::{Parser, Subcommand};
use goalsave_core::Config;

mod commands;
mod logging;
mod notifier;

#[derive(Parser)]
#[command(name = "goalsave", version, about = "GoalSave goal monitoring and notifications")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one evaluation pass over a goals file
    Check(commands::check::CheckArgs),
    /// Keep evaluating a goals file until Ctrl-C
    Watch(commands::watch::WatchArgs),
    /// Notification log
    Notifications {
        #[command(subcommand)]
        action: commands::notifications::NotificationsAction,
    },
    /// Notification preferences
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Milestone progress recorded for a goal
    Progress(commands::progress::ProgressArgs),
    /// Forget milestone progress for a goal so its thresholds fire again
    Reset(commands::progress::ResetArgs),
}

fn main() {
    let cli = Cli::parse();

    let config = Config::load();
    let filter = config
        .as_ref()
        .map(|c| c.logging.filter.clone())
        .unwrap_or_else(|_| "warn".to_string());
    logging::init(&filter, cli.verbose);
    let config = config.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config unreadable, using defaults");
        Config::default()
    });

    let result = match cli.command {
        Commands::Check(args) => commands::check::run(args, &config),
        Commands::Watch(args) => commands::watch::run(args, &config),
        Commands::Notifications { action } => commands::notifications::run(action, &config),
        Commands::Settings { action } => commands::settings::run(action, &config),
        Commands::Config { action } => commands::config::run(action),
        Commands::Progress(args) => commands::progress::run(args, &config),
        Commands::Reset(args) => commands::progress::reset(args, &config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

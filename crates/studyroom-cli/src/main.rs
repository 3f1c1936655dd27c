use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod sink;

#[derive(Parser)]
#[command(name = "studyroom-cli", version, about = "Studyroom CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reminder management
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Notification configuration
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Schedule inspection and upkeep
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Reminder { action } => commands::reminder::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

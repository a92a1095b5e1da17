use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "stempeluhr-cli", version, about = "Stempeluhr work-time tracking CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manual session control
    Track {
        #[command(subcommand)]
        action: commands::track::TrackAction,
    },
    /// Simulated sensor signals
    Signal {
        #[command(subcommand)]
        action: commands::signal::SignalAction,
    },
    /// Tracking entry management
    Entries {
        #[command(subcommand)]
        action: commands::entries::EntriesAction,
    },
    /// CSV export of a date range
    Export {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: String,
        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: String,
        /// Target directory (default: the data directory)
        #[arg(long)]
        dir: Option<std::path::PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Work-time statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Reminder checks for today
    Remind {
        /// Time of day to evaluate, HH:MM (default: now)
        #[arg(long)]
        at: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Track { action } => commands::track::run(action),
        Commands::Signal { action } => commands::signal::run(action),
        Commands::Entries { action } => commands::entries::run(action),
        Commands::Export { from, to, dir } => commands::export::run(&from, &to, dir),
        Commands::Config { action } => commands::config::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Remind { at } => commands::remind::run(at.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

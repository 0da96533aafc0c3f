use clap::{Parser, Subcommand};
use dayblocks_core::Config;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dayblocks", version, about = "Work through the day one project block at a time")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive today's sequence interactively (commands on stdin, events on stdout)
    Run,
    /// Show today's sequence
    Sequence {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show today's productivity
    Productivity {
        /// Recompute from sessions and sleep instead of asking the server
        #[arg(long)]
        local: bool,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show last night's sleep
    Sleep,
    /// Show tracked time per day
    Sessions {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the monthly task completion grid
    Completions {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Convert between duration text and seconds
    Duration {
        #[command(subcommand)]
        action: commands::duration::DurationAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr. `RUST_LOG` wins over the configured filter.
fn init_tracing(configured: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let loaded = Config::load();
    init_tracing(
        loaded
            .as_ref()
            .map(|config| config.logging.filter.as_str())
            .unwrap_or("info"),
    );
    if let Err(err) = &loaded {
        warn!(%err, "config could not be loaded");
    }

    let result = match cli.command {
        // Usable with a broken config file, so it can be inspected or reset.
        Commands::Duration { action } => commands::duration::run(action),
        Commands::Config { action } => commands::config::run(action),
        command => match loaded {
            Ok(config) => run_with_config(command, &config).await,
            Err(err) => Err(err.into()),
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run_with_config(command: Commands, config: &Config) -> commands::CliResult {
    match command {
        Commands::Run => commands::run::run(config).await,
        Commands::Sequence { json } => commands::sequence::run(config, json).await,
        Commands::Productivity { local, json } => {
            commands::productivity::run(config, local, json).await
        }
        Commands::Sleep => commands::sleep::run(config).await,
        Commands::Sessions { json } => commands::sessions::run(config, json).await,
        Commands::Completions { year, month, json } => {
            commands::completions::run(config, year, month, json).await
        }
        Commands::Duration { action } => commands::duration::run(action),
        Commands::Config { action } => commands::config::run(action),
    }
}

mod classifier;
mod commands;
mod config;
mod notifier;
mod provider;
mod render;
mod source;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use config::AppConfig;

#[derive(Parser)]
#[command(name = "taskcal")]
#[command(about = "Prioritize your task list with an LLM and schedule it on your calendar")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify, schedule and submit tasks, then email a confirmation
    Run {
        /// Task list, one task per line (defaults to TASKCAL_TASKS_FILE or task.txt)
        #[arg(short, long)]
        tasks: Option<PathBuf>,

        /// Don't send the confirmation email
        #[arg(long)]
        no_email: bool,
    },
    /// Show the schedule a run would create, without touching the calendar
    Plan {
        #[arg(short, long)]
        tasks: Option<PathBuf>,
    },
    /// Authenticate with a calendar provider
    Auth {
        provider: Option<String>, // e.g. "google"
    },
    /// Schedule a saved classifier reply (reads stdin when no file is given)
    Parse { file: Option<PathBuf> },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // A missing .env is fine; the process environment still applies
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }

    let config = AppConfig::load()?;

    match cli.command {
        Commands::Run { tasks, no_email } => commands::run::run(&config, tasks, no_email).await,
        Commands::Plan { tasks } => commands::plan::run(&config, tasks).await,
        Commands::Auth { provider } => {
            let provider = provider.unwrap_or_else(|| config.calendar.provider.clone());
            commands::auth::run(&provider).await
        }
        Commands::Parse { file } => commands::parse::run(&config, file.as_deref()),
    }
}

//! HIDS Control - capture and verify host configuration baselines
//!
//! Without a subcommand, shows the interactive menu.

use anyhow::Result;
use clap::{Parser, Subcommand};
use hidsctl::commands::{self, Session};
use hidsctl::errors::{exit_code_for, EXIT_SUCCESS};
use hidsctl::logging;
use hidsctl::menu::{self, Selection};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hidsctl")]
#[command(about = "Host integrity checks against a captured configuration baseline", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: $HIDS_CONFIG or ./hids.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reference snapshot file (overrides reference_path)
    #[arg(long, global = true)]
    reference: Option<PathBuf>,

    /// Alert log file (overrides log_path)
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the current state as the new reference
    Capture,

    /// Compare the live system with the reference and log alerts
    Check,

    /// Register a daily check with the Task Scheduler
    Schedule {
        /// Task name (overrides schedule.task_name)
        #[arg(long)]
        task_name: Option<String>,

        /// Daily start time, HH:MM (overrides schedule.start_time)
        #[arg(long)]
        time: Option<String>,
    },

    /// Show the stored reference snapshot
    Show,

    /// Show the most recent alerts
    Alerts {
        /// Number of lines to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS as u8),
        Err(e) => {
            eprintln!("{} {:#}", "[ERROR]".red(), e);
            ExitCode::from(exit_code_for(&e) as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let session = Session::load(cli.config.as_deref(), cli.reference, cli.log)?;

    let command = match cli.command {
        Some(command) => command,
        None => match menu::prompt(std::io::stdin().lock(), std::io::stdout())? {
            Selection::Capture => Commands::Capture,
            Selection::Check => Commands::Check,
            Selection::Schedule => Commands::Schedule {
                task_name: None,
                time: None,
            },
        },
    };

    match command {
        Commands::Capture => commands::capture(&session).await,
        Commands::Check => commands::check(&session).await,
        Commands::Schedule { task_name, time } => {
            commands::schedule(&session, task_name, time).await
        }
        Commands::Show => commands::show(&session),
        Commands::Alerts { limit } => commands::alerts(&session, limit),
        Commands::Config => commands::config_show(&session),
    }
}

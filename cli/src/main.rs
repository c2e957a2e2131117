mod commands;
mod config;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{cmd_add, cmd_delete, cmd_reset, cmd_session, cmd_summary, cmd_weight};
use crate::config::Config;
use macrolog_core::rollover::{Clock, SystemClock};
use macrolog_core::{Database, Ledger};

#[derive(Parser)]
#[command(
    name = "macrolog",
    version,
    about = "Log today's meals against weight-based macro targets",
    long_about = "Log today's meals against weight-based macro targets.\n\n\
                  Targets: carbs = 2 g/kg, protein = 1.5 g/kg, fat = 40 g.\n\
                  Only the current day is kept; earlier days are discarded."
)]
struct Cli {
    /// Database file (default: platform data directory)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set today's body weight in kg and show the derived targets
    Weight {
        /// Weight in kilograms
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a meal entry for today
    Add {
        /// Food name
        food: String,
        /// Carbohydrates in grams (blank counts as 0)
        #[arg(short, long, default_value = "", allow_hyphen_values = true)]
        carbs: String,
        /// Protein in grams (blank counts as 0)
        #[arg(short, long, default_value = "", allow_hyphen_values = true)]
        protein: String,
        /// Fat in grams (blank counts as 0)
        #[arg(short, long, default_value = "", allow_hyphen_values = true)]
        fat: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete meal entries by ID
    Delete {
        /// Entry IDs to delete
        entry_ids: Vec<i64>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show today's entries, totals and progress toward targets
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report the earlier days discarded when the ledger was opened
    Reset {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive session that resets itself at midnight
    Session {
        /// Seconds between date checks
        #[arg(long, default_value = "60")]
        check_interval: u64,
    },
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging() {
    // stdout carries command output, including --json
    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(format)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    let db = Database::open(&config.db_path)?;
    let mut ledger = Ledger::open(db, SystemClock.today())?;
    tracing::debug!(path = %config.db_path.display(), date = %ledger.current_date(), "Ledger opened");

    match cli.command {
        Commands::Weight { value, json } => cmd_weight(&mut ledger, &value, json),
        Commands::Add {
            food,
            carbs,
            protein,
            fat,
            json,
        } => cmd_add(&mut ledger, &food, &carbs, &protein, &fat, json),
        Commands::Delete {
            entry_ids,
            yes,
            json,
        } => cmd_delete(&mut ledger, &entry_ids, yes, json),
        Commands::Summary { json } => cmd_summary(&ledger, json),
        Commands::Reset { json } => cmd_reset(&ledger, json),
        Commands::Session { check_interval } => cmd_session(ledger, check_interval).await,
    }
}

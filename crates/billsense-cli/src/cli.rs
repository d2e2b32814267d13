//! CLI argument definitions using clap
//!
//! The command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Billsense - Find the recurring bills in your bank transactions
#[derive(Parser)]
#[command(name = "billsense")]
#[command(about = "Recurring bill detection for bank transaction exports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Detection config override (TOML)
    ///
    /// Defaults to ~/.config/billsense/detection.toml when present,
    /// otherwise the built-in settings.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect recurring bills in a transaction file
    Detect {
        /// Transaction file (.json or .csv)
        #[arg(short, long)]
        file: PathBuf,

        /// Bill preferences (JSON keyed by bill id)
        #[arg(long)]
        prefs: Option<PathBuf>,

        /// Print bills as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show bills due soon
    Upcoming {
        /// Transaction file (.json or .csv)
        #[arg(short, long)]
        file: PathBuf,

        /// Look-ahead window in days
        #[arg(short, long, default_value = "7")]
        days: i64,

        /// Bill preferences (JSON keyed by bill id)
        #[arg(long)]
        prefs: Option<PathBuf>,

        /// Print bills as JSON
        #[arg(long)]
        json: bool,
    },

    /// Monthly totals, bills by category and overlapping services
    Summary {
        /// Transaction file (.json or .csv)
        #[arg(short, long)]
        file: PathBuf,

        /// Bill preferences (JSON keyed by bill id)
        #[arg(long)]
        prefs: Option<PathBuf>,
    },

    /// Print the effective detection config
    Config {
        /// Print the override file location instead
        #[arg(long)]
        path: bool,
    },
}

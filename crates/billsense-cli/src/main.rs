//! Billsense CLI - Recurring bill detection
//!
//! Usage:
//!   billsense detect --file feed.json        List recurring bills
//!   billsense upcoming --file feed.json      Bills due in the next week
//!   billsense summary --file feed.json       Monthly totals and overlaps
//!   billsense config                         Show effective detection config

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // stderr keeps stdout clean for --json output
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Detect { file, prefs, json } => {
            commands::cmd_detect(config, &file, prefs.as_deref(), json)
        }
        Commands::Upcoming {
            file,
            days,
            prefs,
            json,
        } => commands::cmd_upcoming(config, &file, days, prefs.as_deref(), json),
        Commands::Summary { file, prefs } => {
            commands::cmd_summary(config, &file, prefs.as_deref())
        }
        Commands::Config { path } => commands::cmd_config(config, path),
    }
}

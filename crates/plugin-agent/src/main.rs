//! Plugin Agent CLI
//!
//! Drives reconciliation cycles that keep an agent's plugin directories
//! identical to the plugin archive published by its server.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the command succeeded in its own terms (no drift, no failed entries).
fn run() -> Result<bool> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = commands::load_config(&cli)?;
    match cli.command {
        Commands::Sync { dry_run, json } => commands::run_sync(config, dry_run, json),
        Commands::Check { json } => commands::run_check(config, json),
    }
}

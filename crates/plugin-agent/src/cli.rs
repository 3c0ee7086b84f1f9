//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Plugin agent - keep local plugin directories in sync with the server archive
#[derive(Parser, Debug)]
#[command(name = "plugin-agent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Agent config file (TOML, JSON or YAML)
    #[arg(long, global = true, env = "PLUGIN_AGENT_CONFIG", default_value = "agent.toml")]
    pub config: PathBuf,

    /// Live plugin root, overrides `plugins_dir` from the config file
    #[arg(long, global = true, env = "PLUGIN_AGENT_PLUGINS_PATH")]
    pub plugins_dir: Option<PathBuf>,

    /// Plugins archive, overrides `archive` from the config file
    #[arg(long, global = true, env = "PLUGIN_AGENT_ARCHIVE")]
    pub archive: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run one reconciliation cycle
    ///
    /// Exits with status 1 if the cycle was aborted or completed with errors.
    Sync {
        /// Stage and plan without touching the plugin directories
        #[arg(long)]
        dry_run: bool,

        /// Print the cycle report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report whether the plugin directories have drifted from the archive
    ///
    /// Exits with status 1 on drift.
    Check {
        /// Print the cycle report as JSON
        #[arg(long)]
        json: bool,
    },
}

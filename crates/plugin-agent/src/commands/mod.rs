//! Command implementations for plugin-agent

pub mod check;
pub mod sync;

pub use check::run_check;
pub use sync::run_sync;

use colored::Colorize;
use plugin_sync::{AgentConfig, CategoryReport, CycleReport, LoggingListener, PluginAgent};

use crate::cli::Cli;
use crate::error::Result;

/// Load the config file and apply command-line overrides.
pub fn load_config(cli: &Cli) -> Result<AgentConfig> {
    let mut config = AgentConfig::load(&cli.config)?;
    if let Some(plugins_dir) = &cli.plugins_dir {
        config.plugins_dir = plugins_dir.clone();
    }
    if let Some(archive) = &cli.archive {
        config.archive = archive.clone();
    }
    config.validate()?;
    tracing::debug!(?config, "Resolved agent configuration");
    Ok(config)
}

fn build_agent(config: AgentConfig) -> PluginAgent {
    let mut agent = PluginAgent::new(config);
    agent.add_listener(LoggingListener);
    agent
}

fn print_json(report: &CycleReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// One summary line per category, e.g. `bundled: +1 ~0 -2 (4 unchanged)`
fn print_category(category: &CategoryReport) {
    let plan = &category.plan;
    let label = if category.staged {
        category.category.to_string().cyan()
    } else {
        format!("{} (not in archive)", category.category).cyan()
    };
    println!(
        "   {}: {} {} {} ({} unchanged)",
        label,
        format!("+{}", plan.to_add.len()).green(),
        format!("~{}", plan.to_replace.len()).yellow(),
        format!("-{}", plan.to_remove.len()).red(),
        plan.unchanged
    );
    for key in &plan.to_add {
        println!("      {} {}", "+".green(), key);
    }
    for key in &plan.to_replace {
        println!("      {} {}", "~".yellow(), key);
    }
    for key in &plan.to_remove {
        println!("      {} {}", "-".red(), key);
    }
}

/// Print an aborted cycle. Returns `false` so callers can use it as the result.
fn print_abort(report: &CycleReport) -> bool {
    let message = report
        .abort
        .as_ref()
        .map(|a| a.message.as_str())
        .unwrap_or("unknown reason");
    println!("{} Cycle aborted: {}", "ABORTED".red().bold(), message);
    println!("   Plugin directories were not modified.");
    false
}

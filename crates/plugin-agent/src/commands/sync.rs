//! Sync command implementation

use colored::Colorize;
use plugin_sync::{AgentConfig, CycleOutcome};

use super::{build_agent, print_abort, print_category, print_json};
use crate::error::Result;

/// Run (or preview) one reconciliation cycle.
///
/// Returns `true` if the cycle succeeded.
pub fn run_sync(config: AgentConfig, dry_run: bool, json: bool) -> Result<bool> {
    if !json {
        println!(
            "{} {} {} into {}",
            "=>".blue().bold(),
            if dry_run { "Planning sync of" } else { "Syncing" },
            config.archive.display(),
            config.plugins_dir.display()
        );
    }

    let agent = build_agent(config);
    let report = if dry_run {
        agent.check()?
    } else {
        agent.run_cycle()?
    };

    if json {
        print_json(&report)?;
        return Ok(report.is_success());
    }

    if report.outcome == CycleOutcome::Aborted {
        return Ok(print_abort(&report));
    }

    for category in &report.categories {
        print_category(category);
    }

    let failures = report.failures();
    if !failures.is_empty() {
        println!();
        println!(
            "{} {} entries failed:",
            "ERRORS".red().bold(),
            failures.len()
        );
        for failure in &failures {
            println!("   {} {}", "!".red(), failure.message);
        }
        println!();
        println!("The next cycle will retry them.");
        return Ok(false);
    }

    if dry_run {
        println!("{} Dry run complete. No changes made.", "OK".green().bold());
    } else if report.changes().is_empty() {
        println!("{} Plugins already in sync.", "OK".green().bold());
    } else {
        println!("{} Plugins synchronized.", "OK".green().bold());
    }
    Ok(true)
}

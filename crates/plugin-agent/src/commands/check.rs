//! Check command implementation

use colored::Colorize;
use plugin_sync::{AgentConfig, CycleOutcome};

use super::{build_agent, print_abort, print_category, print_json};
use crate::error::Result;

/// Compare the plugin directories with the archive without modifying them.
///
/// Returns `true` when nothing has drifted.
pub fn run_check(config: AgentConfig, json: bool) -> Result<bool> {
    if !json {
        println!("{} Checking plugin directories...", "=>".blue().bold());
    }

    let report = build_agent(config).check()?;
    let in_sync = report.outcome != CycleOutcome::Aborted
        && report.failures().is_empty()
        && !report.has_drift();

    if json {
        print_json(&report)?;
        return Ok(in_sync);
    }

    if report.outcome == CycleOutcome::Aborted {
        return Ok(print_abort(&report));
    }

    if in_sync {
        println!("{} Plugins match the archive. No drift detected.", "OK".green().bold());
        return Ok(true);
    }

    println!("{} Plugin directories have drifted:", "DRIFTED".red().bold());
    for category in report.categories.iter().filter(|c| !c.plan.is_empty()) {
        print_category(category);
    }
    for failure in report.failures() {
        println!("   {} {}", "!".red(), failure.message);
    }
    println!();
    println!("Run {} to repair.", "plugin-agent sync".cyan());
    Ok(false)
}

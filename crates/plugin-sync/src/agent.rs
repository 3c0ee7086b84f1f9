//! Plugin agent
//!
//! Wires configuration, the single-flight guard, the engine and change
//! listeners together. This is what a scheduler or the CLI calls once per
//! cycle.

use std::fmt;

use crate::Result;
use crate::config::AgentConfig;
use crate::engine::ReconcileEngine;
use crate::guard::SingleFlight;
use crate::notify::{ChangeNotice, PluginChangeListener};
use crate::report::CycleReport;

/// Runs guarded reconciliation cycles for one plugin root
pub struct PluginAgent {
    config: AgentConfig,
    guard: SingleFlight,
    listeners: Vec<Box<dyn PluginChangeListener>>,
}

impl fmt::Debug for PluginAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginAgent")
            .field("config", &self.config)
            .field("guard", &self.guard)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl PluginAgent {
    pub fn new(config: AgentConfig) -> Self {
        let guard = SingleFlight::new(config.lock_path());
        Self {
            config,
            guard,
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Register a listener notified after every mutating cycle.
    pub fn add_listener(&mut self, listener: impl PluginChangeListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Run one reconciliation cycle.
    ///
    /// Returns [`crate::Error::CycleInProgress`] without touching the live tree
    /// if another cycle holds the guard. Any other outcome, including an
    /// aborted cycle, is carried by the report.
    pub fn run_cycle(&self) -> Result<CycleReport> {
        let report = self.guarded(false)?;
        if let Some(notice) = ChangeNotice::from_report(&report) {
            for listener in &self.listeners {
                listener.plugins_changed(&notice);
            }
        }
        Ok(report)
    }

    /// Plan a cycle without mutating anything; see [`CycleReport::has_drift`].
    pub fn check(&self) -> Result<CycleReport> {
        self.guarded(true)
    }

    fn guarded(&self, dry_run: bool) -> Result<CycleReport> {
        let _lease = self.guard.try_acquire()?;
        let engine = ReconcileEngine::new(self.config.sync_options(dry_run));
        Ok(engine.run(&self.config.archive, &self.config.plugins_dir))
    }
}

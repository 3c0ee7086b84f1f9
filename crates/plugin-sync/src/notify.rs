//! Post-reconciliation notifications
//!
//! After a cycle mutates the live tree, the plugin loader must rescan the
//! affected category directories. The engine only reports what changed;
//! loading plugins is the listener's business.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::report::{CategoryChange, CycleReport};

/// Categories mutated by one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotice {
    pub cycle_id: Uuid,
    /// Only categories with at least one applied change
    pub changes: Vec<CategoryChange>,
}

impl ChangeNotice {
    /// Build a notice from a finished cycle, or `None` if nothing was mutated.
    pub fn from_report(report: &CycleReport) -> Option<Self> {
        if report.dry_run {
            return None;
        }
        let changes = report.changes();
        (!changes.is_empty()).then_some(Self {
            cycle_id: report.cycle_id,
            changes,
        })
    }
}

/// Consumer of change notices, typically the plugin loader
pub trait PluginChangeListener: Send + Sync {
    fn plugins_changed(&self, notice: &ChangeNotice);
}

impl<F> PluginChangeListener for F
where
    F: Fn(&ChangeNotice) + Send + Sync,
{
    fn plugins_changed(&self, notice: &ChangeNotice) {
        self(notice)
    }
}

/// Listener that only logs what changed
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

impl PluginChangeListener for LoggingListener {
    fn plugins_changed(&self, notice: &ChangeNotice) {
        for change in &notice.changes {
            tracing::info!(
                cycle_id = %notice.cycle_id,
                category = %change.category,
                added = change.added.len(),
                replaced = change.replaced.len(),
                removed = change.removed.len(),
                "Plugin directory changed"
            );
        }
    }
}

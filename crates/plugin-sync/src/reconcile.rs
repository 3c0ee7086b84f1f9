//! Directory Reconciler
//!
//! Converges one live category directory to one staged category directory.
//! Removals run first, then replacements and additions. A failed entry is
//! recorded and the remaining entries are still processed.

use std::path::Path;

use plugin_fs::{EntryKey, PluginCategory, io};

use crate::Error;
use crate::plan::{CompareMode, ReconciliationPlan};
use crate::report::{CategoryReport, EntryFailure, EntryOp};
use crate::snapshot::DirectorySnapshot;

/// Applies reconciliation plans to live category directories
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler {
    compare: CompareMode,
    dry_run: bool,
}

impl Reconciler {
    pub fn new(compare: CompareMode, dry_run: bool) -> Self {
        Self { compare, dry_run }
    }

    /// Reconcile one category.
    ///
    /// `staged_dir` is `None` when the archive has no folder for `category`,
    /// which empties the live directory. The live directory is created if
    /// absent. Never fails as a whole: per-entry errors land in the report.
    pub fn reconcile(
        &self,
        category: PluginCategory,
        live_dir: &Path,
        staged_dir: Option<&Path>,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(category, staged_dir.is_some());

        if !self.dry_run
            && let Err(e) = io::ensure_dir(live_dir)
        {
            self.record(&mut report, None, EntryOp::Scan, e);
            return report;
        }

        // Items that cannot be keyed are reported and left alone; the rest
        // of the category is still reconciled
        let live = match DirectorySnapshot::scan(live_dir) {
            Ok((snapshot, issues)) => {
                for issue in issues {
                    self.record(&mut report, issue.key.as_ref(), EntryOp::Scan, issue.error);
                }
                snapshot
            }
            Err(e) => {
                self.record(&mut report, None, EntryOp::Scan, e);
                return report;
            }
        };
        let staged = match staged_dir.map(DirectorySnapshot::capture).transpose() {
            Ok(snapshot) => snapshot.unwrap_or_default(),
            Err(e) => {
                self.record(&mut report, None, EntryOp::Scan, e);
                return report;
            }
        };

        report.plan = ReconciliationPlan::compute(&live, &staged, self.compare);

        tracing::info!(
            category = %category,
            add = report.plan.to_add.len(),
            replace = report.plan.to_replace.len(),
            remove = report.plan.to_remove.len(),
            unchanged = report.plan.unchanged,
            dry_run = self.dry_run,
            "Planned category reconciliation"
        );

        if self.dry_run || report.plan.is_empty() {
            return report;
        }

        let plan = report.plan.clone();

        for key in &plan.to_remove {
            let Some(entry) = live.get(key) else {
                continue;
            };
            match io::remove_entry(&entry.source_path) {
                Ok(()) => {
                    tracing::debug!(category = %category, entry = %key, "Removed plugin");
                    report.applied.removed.push(key.clone());
                }
                Err(e) => self.record(&mut report, Some(key), EntryOp::Remove, e),
            }
        }

        // An empty directory, left by removals or already there, would block
        // a new file of the same name
        if !(plan.to_remove.is_empty() && plan.to_add.is_empty())
            && let Err(e) = io::prune_empty_dirs(live_dir)
        {
            tracing::warn!(category = %category, error = %e, "Failed to prune empty directories");
        }

        let writes = plan
            .to_replace
            .iter()
            .map(|k| (k, EntryOp::Replace))
            .chain(plan.to_add.iter().map(|k| (k, EntryOp::Add)));

        for (key, op) in writes {
            let Some(source) = staged.get(key) else {
                continue;
            };
            match io::copy_atomic(&source.source_path, &key.under(live_dir)) {
                Ok(bytes) => {
                    tracing::debug!(category = %category, entry = %key, %op, bytes, "Wrote plugin");
                    match op {
                        EntryOp::Replace => report.applied.replaced.push(key.clone()),
                        _ => report.applied.added.push(key.clone()),
                    }
                }
                Err(e) => self.record(&mut report, Some(key), op, e),
            }
        }

        report
    }

    fn record(
        &self,
        report: &mut CategoryReport,
        entry: Option<&EntryKey>,
        op: EntryOp,
        source: plugin_fs::Error,
    ) {
        let error = Error::EntryIo {
            category: report.category,
            entry: entry.cloned(),
            op,
            source,
        };
        tracing::warn!(category = %report.category, %op, error = %error, "Plugin entry operation failed");
        report.failures.push(EntryFailure {
            category: report.category,
            entry: entry.cloned(),
            op,
            message: error.to_string(),
        });
    }
}

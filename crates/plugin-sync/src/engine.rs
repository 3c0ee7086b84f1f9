//! ReconcileEngine implementation
//!
//! The engine runs one reconciliation cycle: stage the archive, then
//! reconcile every category against the live plugin root. It holds no state
//! between calls; mutual exclusion of cycles belongs to the caller (see
//! [`crate::guard::SingleFlight`]).

use std::path::{Path, PathBuf};

use plugin_fs::{PluginCategory, PluginLayout};

use crate::archive::{ArchiveSource, open_archive};
use crate::plan::CompareMode;
use crate::reconcile::Reconciler;
use crate::report::{AbortKind, CyclePhase, CycleReport};
use crate::stage::Stager;

/// Options for a reconciliation cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// If true, stage and plan without modifying the live tree
    pub dry_run: bool,
    /// How entry content is compared
    pub compare: CompareMode,
    /// Parent directory for staging trees; system temp dir when `None`
    pub staging_dir: Option<PathBuf>,
}

impl SyncOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}

/// Engine converging a live plugin root to an archive
#[derive(Debug, Clone, Default)]
pub struct ReconcileEngine {
    options: SyncOptions,
}

impl ReconcileEngine {
    pub fn new(options: SyncOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Run one cycle against the archive at `archive`.
    ///
    /// Opening the archive is part of the staging phase: an unreadable
    /// archive aborts the cycle before the live tree is touched.
    pub fn run(&self, archive: &Path, live_root: &Path) -> CycleReport {
        let mut report = CycleReport::begin(self.options.dry_run);
        let span = tracing::info_span!("reconcile_cycle", cycle_id = %report.cycle_id);
        let _enter = span.enter();

        report.enter(CyclePhase::Staging);
        match open_archive(archive) {
            Ok(mut source) => self.reconcile_from(report, source.as_mut(), live_root),
            Err(e) => abort(report, e),
        }
    }

    fn reconcile_from(
        &self,
        mut report: CycleReport,
        source: &mut dyn ArchiveSource,
        live_root: &Path,
    ) -> CycleReport {
        tracing::info!(
            archive = %source.location().display(),
            live_root = %live_root.display(),
            dry_run = self.options.dry_run,
            "Starting reconciliation cycle"
        );

        let staged = match Stager::new(self.options.staging_dir.clone()).stage(source) {
            Ok(staged) => staged,
            Err(e) => return abort(report, e),
        };
        report.ignored_entries = staged.ignored_entries();

        let live = PluginLayout::new(live_root);
        let reconciler = Reconciler::new(self.options.compare, self.options.dry_run);

        for category in PluginCategory::ALL {
            report.enter(CyclePhase::Reconciling(category));
            let staged_dir = staged.category_dir(category);
            let category_report =
                reconciler.reconcile(category, &live.category_dir(category), staged_dir.as_deref());
            report.categories.push(category_report);
        }

        // Staging tree is removed here, whatever the outcome
        drop(staged);

        let report = report.finish();
        let failures = report.failures().len();
        if failures > 0 {
            tracing::warn!(
                outcome = %report.outcome,
                failures,
                "Reconciliation cycle completed with errors"
            );
        } else {
            tracing::info!(
                outcome = %report.outcome,
                changed = report.changes().iter().map(|c| c.len()).sum::<usize>(),
                "Reconciliation cycle finished"
            );
        }
        report
    }
}

fn abort(report: CycleReport, error: crate::Error) -> CycleReport {
    let kind = error.abort_kind().unwrap_or(AbortKind::StagingIo);
    tracing::warn!(error = %error, ?kind, "Reconciliation cycle aborted");
    report.abort(kind, error.to_string())
}

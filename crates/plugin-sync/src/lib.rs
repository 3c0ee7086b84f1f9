//! Plugin Sync
//!
//! Reconciliation engine that makes an agent's local plugin directories an
//! exact mirror of the plugin archive published by its server.
//!
//! A cycle stages the archive into a private temporary tree, then for each
//! plugin category (`bundled`, `external`) computes the difference against
//! the live directory and applies it: removals first, then atomic
//! replacements and additions. Per-entry failures are collected in a
//! [`CycleReport`]; only an unreadable archive or a failed staging step
//! aborts the cycle, and it does so before the live tree is touched.
//!
//! [`PluginAgent`] adds the single-flight guard and change notifications on
//! top of the stateless [`ReconcileEngine`].

pub mod agent;
pub mod archive;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod notify;
pub mod plan;
pub mod reconcile;
pub mod report;
pub mod snapshot;
pub mod stage;

pub use agent::PluginAgent;
pub use archive::{ArchiveEntry, ArchiveSource, DirectoryArchiveSource, ZipArchiveSource, open_archive};
pub use config::AgentConfig;
pub use engine::{ReconcileEngine, SyncOptions};
pub use error::{Error, Result};
pub use guard::{CycleLease, SingleFlight};
pub use notify::{ChangeNotice, LoggingListener, PluginChangeListener};
pub use plan::{CompareMode, ReconciliationPlan};
pub use reconcile::Reconciler;
pub use report::{
    AbortKind, AbortReason, CategoryChange, CategoryReport, CycleOutcome, CyclePhase,
    CycleReport, EntryFailure, EntryOp,
};
pub use snapshot::{DirectorySnapshot, PluginEntry, ScanIssue};
pub use stage::{StagedTree, Stager};

pub use plugin_fs::{EntryKey, PluginCategory};

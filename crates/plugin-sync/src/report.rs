//! Report types for reconciliation cycles
//!
//! A cycle never raises a fatal error. Its result is a [`CycleReport`]
//! describing what was planned, what was applied and what failed, so the
//! caller can decide whether to retry sooner than the next scheduled cycle.

use std::fmt;

use chrono::{DateTime, Utc};
use plugin_fs::{EntryKey, PluginCategory};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plan::ReconciliationPlan;

/// Overall result of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Every category converged
    Success,
    /// Every category was processed but at least one entry failed
    CompletedWithErrors,
    /// The cycle stopped before touching the live tree
    Aborted,
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::CompletedWithErrors => write!(f, "completed with errors"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// States a cycle passes through
///
/// `Idle -> Staging -> Reconciling(Bundled) -> Reconciling(External) -> Done`,
/// or `Staging -> Failed(Staging)` when the archive cannot be staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    Staging,
    Reconciling(PluginCategory),
    Done,
    Failed(Box<CyclePhase>),
}

/// Why a cycle was aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortKind {
    ArchiveUnreadable,
    StagingIo,
}

/// Abort classification plus the underlying message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortReason {
    pub kind: AbortKind,
    pub message: String,
}

/// Operation attempted on a live entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOp {
    /// Listing or preparing the live category directory
    Scan,
    Remove,
    Add,
    Replace,
}

impl fmt::Display for EntryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan => write!(f, "scan"),
            Self::Remove => write!(f, "remove"),
            Self::Add => write!(f, "add"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

/// A failed operation on one entry
///
/// `entry` is `None` when the failure has no key: the category directory
/// itself could not be scanned, or an item name is not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFailure {
    pub category: PluginCategory,
    pub entry: Option<EntryKey>,
    pub op: EntryOp,
    pub message: String,
}

/// Entries actually mutated in one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryChange {
    pub category: PluginCategory,
    pub added: Vec<EntryKey>,
    pub replaced: Vec<EntryKey>,
    pub removed: Vec<EntryKey>,
}

impl CategoryChange {
    pub fn new(category: PluginCategory) -> Self {
        Self {
            category,
            added: Vec::new(),
            replaced: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.replaced.is_empty() && self.removed.is_empty()
    }

    /// Number of mutated entries
    pub fn len(&self) -> usize {
        self.added.len() + self.replaced.len() + self.removed.len()
    }
}

/// Result of reconciling one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: PluginCategory,
    /// Whether the archive carried this category at all
    pub staged: bool,
    pub plan: ReconciliationPlan,
    pub applied: CategoryChange,
    pub failures: Vec<EntryFailure>,
}

impl CategoryReport {
    pub fn new(category: PluginCategory, staged: bool) -> Self {
        Self {
            category,
            staged,
            plan: ReconciliationPlan::default(),
            applied: CategoryChange::new(category),
            failures: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Report from one reconciliation cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Whether the cycle only planned without mutating the live tree
    pub dry_run: bool,
    pub outcome: CycleOutcome,
    /// State machine trail, first entry is always `Idle`
    pub phases: Vec<CyclePhase>,
    pub categories: Vec<CategoryReport>,
    /// Archive entries outside any category folder
    pub ignored_entries: usize,
    pub abort: Option<AbortReason>,
}

impl CycleReport {
    /// Start a report for a new cycle
    pub fn begin(dry_run: bool) -> Self {
        Self {
            cycle_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            dry_run,
            outcome: CycleOutcome::Success,
            phases: vec![CyclePhase::Idle],
            categories: Vec::new(),
            ignored_entries: 0,
            abort: None,
        }
    }

    /// Record a state transition
    pub fn enter(&mut self, phase: CyclePhase) {
        tracing::debug!(cycle_id = %self.cycle_id, phase = ?phase, "cycle phase");
        self.phases.push(phase);
    }

    /// Current state of the cycle
    pub fn phase(&self) -> &CyclePhase {
        // `begin` always seeds `Idle`
        self.phases.last().unwrap_or(&CyclePhase::Idle)
    }

    /// Terminate the cycle as aborted in the current phase
    pub fn abort(mut self, kind: AbortKind, message: String) -> Self {
        let failed = Box::new(self.phase().clone());
        self.enter(CyclePhase::Failed(failed));
        self.outcome = CycleOutcome::Aborted;
        self.abort = Some(AbortReason { kind, message });
        self.finished_at = Some(Utc::now());
        self
    }

    /// Terminate the cycle after all categories were processed
    pub fn finish(mut self) -> Self {
        self.enter(CyclePhase::Done);
        self.outcome = if self.categories.iter().all(CategoryReport::is_success) {
            CycleOutcome::Success
        } else {
            CycleOutcome::CompletedWithErrors
        };
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome == CycleOutcome::Success
    }

    /// All per-entry failures across categories
    pub fn failures(&self) -> Vec<&EntryFailure> {
        self.categories.iter().flat_map(|c| c.failures.iter()).collect()
    }

    /// Whether any category's live tree differs from the archive
    pub fn has_drift(&self) -> bool {
        self.categories.iter().any(|c| !c.plan.is_empty())
    }

    /// Categories that were actually mutated
    pub fn changes(&self) -> Vec<CategoryChange> {
        self.categories
            .iter()
            .filter(|c| !c.applied.is_empty())
            .map(|c| c.applied.clone())
            .collect()
    }

    pub fn category(&self, category: PluginCategory) -> Option<&CategoryReport> {
        self.categories.iter().find(|c| c.category == category)
    }
}

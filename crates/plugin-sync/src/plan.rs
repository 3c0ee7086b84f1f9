//! Reconciliation plans
//!
//! A plan is derived from a live snapshot and a staged snapshot of the same
//! category. It is never persisted.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use plugin_fs::EntryKey;
use plugin_fs::checksum::compute_file_checksum;
use serde::{Deserialize, Serialize};

use crate::snapshot::{DirectorySnapshot, PluginEntry};

const COMPARE_BUF_SIZE: usize = 64 * 1024;

/// How entry content is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Stream both files and compare every byte
    #[default]
    Bytes,
    /// Compare SHA-256 digests
    Sha256,
}

impl std::str::FromStr for CompareMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bytes" | "full" => Ok(Self::Bytes),
            "sha256" | "hash" => Ok(Self::Sha256),
            other => Err(format!("unknown compare mode: {other}")),
        }
    }
}

/// Mutations needed to make a live category equal its staged counterpart
///
/// The three sets are disjoint. Entries present on both sides with equal
/// content are only counted in `unchanged`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    /// Staged but not live
    pub to_add: BTreeSet<EntryKey>,
    /// Live but not staged
    pub to_remove: BTreeSet<EntryKey>,
    /// On both sides with different content
    pub to_replace: BTreeSet<EntryKey>,
    pub unchanged: usize,
}

impl ReconciliationPlan {
    /// Compare two snapshots.
    ///
    /// An entry whose content cannot be read on either side is planned for
    /// replacement, so a read error can never hide a change.
    pub fn compute(live: &DirectorySnapshot, staged: &DirectorySnapshot, compare: CompareMode) -> Self {
        let mut plan = Self::default();

        for staged_entry in staged.iter() {
            match live.get(&staged_entry.key) {
                None => {
                    plan.to_add.insert(staged_entry.key.clone());
                }
                Some(live_entry) => {
                    if entries_equal(live_entry, staged_entry, compare) {
                        plan.unchanged += 1;
                    } else {
                        plan.to_replace.insert(staged_entry.key.clone());
                    }
                }
            }
        }

        plan.to_remove = live
            .keys()
            .filter(|key| !staged.contains(key))
            .cloned()
            .collect();

        plan
    }

    /// Whether the live side already matches
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.to_replace.is_empty()
    }

    /// Number of planned mutations
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len() + self.to_replace.len()
    }
}

/// Content equality of two entries. False on any read error.
pub fn entries_equal(a: &PluginEntry, b: &PluginEntry, compare: CompareMode) -> bool {
    if let (Some(len_a), Some(len_b)) = (a.len, b.len)
        && len_a != len_b
    {
        return false;
    }

    let result = match compare {
        CompareMode::Bytes => files_equal(&a.source_path, &b.source_path),
        CompareMode::Sha256 => compute_file_checksum(&a.source_path)
            .and_then(|sum_a| Ok(sum_a == compute_file_checksum(&b.source_path)?)),
    };

    result.unwrap_or_else(|e| {
        tracing::debug!(
            entry = %a.key,
            error = %e,
            "content comparison failed, treating entry as changed"
        );
        false
    })
}

fn files_equal(a: &Path, b: &Path) -> io::Result<bool> {
    let mut file_a = File::open(a)?;
    let mut file_b = File::open(b)?;
    let mut buf_a = vec![0u8; COMPARE_BUF_SIZE];
    let mut buf_b = vec![0u8; COMPARE_BUF_SIZE];

    loop {
        let n_a = fill(&mut file_a, &mut buf_a)?;
        let n_b = fill(&mut file_b, &mut buf_b)?;
        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or the reader is exhausted.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

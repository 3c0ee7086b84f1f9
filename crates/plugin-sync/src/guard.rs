//! Single-flight guard for reconciliation cycles
//!
//! Two cycles racing on the same live tree could interleave removals and
//! writes, so at most one may run at a time. The guard combines an
//! in-process mutex with an advisory `fs2` lock on a lock file, which also
//! excludes cycles started by other processes.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, TryLockError};

use fs2::FileExt;

use crate::{Error, Result};

/// Owner of the "reconciliation in progress" flag
#[derive(Debug)]
pub struct SingleFlight {
    in_process: Mutex<()>,
    lock_path: PathBuf,
}

/// Proof that the holder may run a cycle; released on drop
#[derive(Debug)]
pub struct CycleLease<'a> {
    _file: File,
    _guard: MutexGuard<'a, ()>,
}

impl SingleFlight {
    pub fn new(lock_path: impl Into<PathBuf>) -> Self {
        Self {
            in_process: Mutex::new(()),
            lock_path: lock_path.into(),
        }
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Take the guard without waiting.
    ///
    /// # Errors
    ///
    /// [`Error::CycleInProgress`] if another cycle holds the guard in this
    /// process or another one; [`Error::Fs`] if the lock file cannot be opened.
    pub fn try_acquire(&self) -> Result<CycleLease<'_>> {
        let guard = match self.in_process.try_lock() {
            Ok(guard) => guard,
            // A panicked cycle has ended; the flag itself is still valid
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return Err(self.in_progress()),
        };

        if let Some(parent) = self.lock_path.parent() {
            plugin_fs::io::ensure_dir(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| plugin_fs::Error::io(&self.lock_path, e))?;

        if file.try_lock_exclusive().is_err() {
            return Err(self.in_progress());
        }

        tracing::debug!(lock = %self.lock_path.display(), "Acquired reconciliation lock");
        Ok(CycleLease {
            _file: file,
            _guard: guard,
        })
    }

    fn in_progress(&self) -> Error {
        Error::CycleInProgress {
            lock: self.lock_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_acquire_is_rejected_until_release() {
        let dir = tempdir().unwrap();
        let flight = SingleFlight::new(dir.path().join(".plugin-sync.lock"));

        let lease = flight.try_acquire().unwrap();
        assert!(matches!(
            flight.try_acquire(),
            Err(Error::CycleInProgress { .. })
        ));

        drop(lease);
        assert!(flight.try_acquire().is_ok());
    }

    #[test]
    fn test_separate_guards_on_same_file_exclude_each_other() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("agent.lock");
        let first = SingleFlight::new(&path);
        let second = SingleFlight::new(&path);

        let _lease = first.try_acquire().unwrap();
        assert!(matches!(
            second.try_acquire(),
            Err(Error::CycleInProgress { .. })
        ));
    }
}

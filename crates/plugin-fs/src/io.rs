//! Atomic I/O operations with file locking

use std::fs::{self, File};
use std::path::Path;

use fs2::FileExt;

use crate::{Error, Result};

/// Prefix of the hidden temp file written beside a target while it is replaced
pub const TEMP_PREFIX: &str = ".plugin-sync-";

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    Ok(())
}

/// Fill a temp file through `fill`, then rename it over `target`.
///
/// The temp file lives in the same directory as `target`, so the rename never
/// crosses a filesystem boundary, and its name has a fixed length whatever
/// the target is called. The target is never observed missing or
/// half-written: readers see either the old content or the new content.
fn replace_via_temp<F>(target: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut File, &Path) -> Result<()>,
{
    ensure_parent(target)?;
    let parent = target.parent().unwrap_or_else(|| Path::new("."));

    // Removed on drop unless persisted
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| Error::io(parent, e))?;
    let temp_path = temp.path().to_path_buf();

    temp.as_file().lock_exclusive().map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;

    fill(temp.as_file_mut(), &temp_path)?;

    temp.as_file()
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;

    // Released on drop as well
    let _ = FileExt::unlock(temp.as_file());

    temp.persist(target)
        .map(drop)
        .map_err(|e| Error::io(target, e.error))
}

/// Copy `source` over `target` atomically, creating parent directories.
///
/// Content is streamed, so large plugin artifacts are never held in memory.
/// Returns the number of bytes copied.
pub fn copy_atomic(source: &Path, target: &Path) -> Result<u64> {
    let mut copied = 0;
    replace_via_temp(target, |file, temp_path| {
        let mut reader = File::open(source).map_err(|e| Error::io(source, e))?;
        copied = std::io::copy(&mut reader, file).map_err(|e| Error::io(temp_path, e))?;
        Ok(())
    })?;
    Ok(copied)
}

/// Remove a single entry file.
///
/// An entry that is already gone counts as removed.
pub fn remove_entry(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Remove every empty directory below `root`, keeping `root` itself.
///
/// Subdirectories that cannot be listed or removed count as populated and
/// are left in place. Returns the number of directories removed.
pub fn prune_empty_dirs(root: &Path) -> Result<usize> {
    if !root.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(root).map_err(|e| Error::io(root, e))? {
        let entry = entry.map_err(|e| Error::io(root, e))?;
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            removed += prune_subtree(&entry.path()).0;
        }
    }
    Ok(removed)
}

/// Returns the number of directories removed and whether `dir` is gone.
fn prune_subtree(dir: &Path) -> (usize, bool) {
    let Ok(entries) = fs::read_dir(dir) else {
        return (0, false);
    };

    let mut removed = 0;
    let mut empty = true;
    for entry in entries {
        match entry.and_then(|e| Ok((e.file_type()?, e.path()))) {
            Ok((file_type, path)) if file_type.is_dir() => {
                let (count, gone) = prune_subtree(&path);
                removed += count;
                empty &= gone;
            }
            _ => empty = false,
        }
    }

    if empty && fs::remove_dir(dir).is_ok() {
        (removed + 1, true)
    } else {
        (removed, false)
    }
}

/// Create `dir` and its parents if missing.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}

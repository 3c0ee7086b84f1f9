//! Directory snapshots
//!
//! A snapshot maps every entry key found under one category directory to the
//! file that holds its content. Snapshots are taken fresh each cycle and
//! dropped once the plan has been applied.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use plugin_fs::{EntryKey, Result};
use walkdir::WalkDir;

/// A named plugin artifact inside one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEntry {
    pub key: EntryKey,
    /// Where the content lives (staged or live)
    pub source_path: PathBuf,
    /// Size in bytes, when it could be determined
    pub len: Option<u64>,
}

/// Something below a category directory that could not be recorded as an entry
#[derive(Debug)]
pub struct ScanIssue {
    pub path: PathBuf,
    /// Key of the unreadable item, when its name is valid UTF-8
    pub key: Option<EntryKey>,
    pub error: plugin_fs::Error,
}

/// Entry set of one category directory at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    entries: BTreeMap<EntryKey, PluginEntry>,
}

impl DirectorySnapshot {
    /// Snapshot with no entries, used for a category the archive omits.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Walk `dir` and record every non-directory below it.
    ///
    /// Fails on the first item that cannot be recorded. Used for staging
    /// trees, which the agent wrote itself.
    pub fn capture(dir: &Path) -> Result<Self> {
        let (snapshot, issues) = Self::scan(dir)?;
        match issues.into_iter().next() {
            Some(issue) => Err(issue.error),
            None => Ok(snapshot),
        }
    }

    /// Walk `dir`, collecting items that cannot be recorded instead of
    /// failing.
    ///
    /// A missing directory yields an empty snapshot. Symlinks are recorded as
    /// entries and are not followed. Unreadable subdirectories and names that
    /// are not valid UTF-8 become [`ScanIssue`]s; the rest of the tree is
    /// still recorded. Only an unreadable `dir` itself is an error.
    pub fn scan(dir: &Path) -> Result<(Self, Vec<ScanIssue>)> {
        let mut entries = BTreeMap::new();
        let mut issues = Vec::new();
        if !dir.exists() {
            return Ok((Self { entries }, issues));
        }
        fs::read_dir(dir).map_err(|e| plugin_fs::Error::io(dir, e))?;

        for item in WalkDir::new(dir).min_depth(1).follow_links(false) {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    let path = e.path().unwrap_or(dir).to_path_buf();
                    issues.push(ScanIssue {
                        key: relative_key(dir, &path).ok(),
                        error: plugin_fs::Error::io(&path, e.into()),
                        path,
                    });
                    continue;
                }
            };
            if item.file_type().is_dir() {
                continue;
            }

            let key = match relative_key(dir, item.path()) {
                Ok(key) => key,
                Err(error) => {
                    issues.push(ScanIssue {
                        path: item.path().to_path_buf(),
                        key: None,
                        error,
                    });
                    continue;
                }
            };
            let len = fs::metadata(item.path()).ok().map(|m| m.len());

            entries.insert(
                key.clone(),
                PluginEntry {
                    key,
                    source_path: item.path().to_path_buf(),
                    len,
                },
            );
        }

        Ok((Self { entries }, issues))
    }

    pub fn get(&self, key: &EntryKey) -> Option<&PluginEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &EntryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &EntryKey> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn relative_key(dir: &Path, path: &Path) -> Result<EntryKey> {
    EntryKey::from_relative(path.strip_prefix(dir).unwrap_or(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let snapshot = DirectorySnapshot::capture(&dir.path().join("external")).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_nested_files_are_keyed_by_relative_path() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib/deps")).unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("p1.jar"), "one").unwrap();
        fs::write(dir.path().join("lib/deps/d.jar"), "dep").unwrap();

        let snapshot = DirectorySnapshot::capture(dir.path()).unwrap();

        let keys: Vec<&str> = snapshot.keys().map(EntryKey::as_str).collect();
        assert_eq!(keys, vec!["lib/deps/d.jar", "p1.jar"]);

        let entry = snapshot.get(&EntryKey::new("p1.jar").unwrap()).unwrap();
        assert_eq!(entry.len, Some(3));
        assert_eq!(entry.source_path, dir.path().join("p1.jar"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_issues_not_keys() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"\xffa.jar")), "a").unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"\xfea.jar")), "b").unwrap();
        fs::write(dir.path().join("ok.jar"), "ok").unwrap();

        let (snapshot, issues) = DirectorySnapshot::scan(dir.path()).unwrap();

        let keys: Vec<&str> = snapshot.keys().map(EntryKey::as_str).collect();
        assert_eq!(keys, vec!["ok.jar"]);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|issue| issue.key.is_none()));
        assert!(DirectorySnapshot::capture(dir.path()).is_err());
    }

    #[test]
    fn test_file_in_place_of_dir_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bundled");
        fs::write(&path, "not a directory").unwrap();

        assert!(DirectorySnapshot::scan(&path).is_err());
    }
}

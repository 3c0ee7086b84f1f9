//! Normalized entry keys for cross-platform comparison

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The key of a plugin entry: its path relative to a category directory.
///
/// Stored with forward slashes so a staged tree and a live tree produce
/// identical keys on every platform. Converted to a native path only at
/// I/O boundaries. A key is never empty, never absolute and never climbs
/// out of its category with `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryKey {
    inner: String,
}

impl EntryKey {
    /// Parse a key from archive or user input.
    ///
    /// Backslashes become forward slashes; empty and `.` segments are dropped.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        let unified = raw.replace('\\', "/");

        if unified.starts_with('/') || has_drive_prefix(&unified) {
            return Err(Error::invalid_entry(raw, "absolute paths are not allowed"));
        }

        let mut segments = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(Error::invalid_entry(raw, "parent traversal is not allowed"));
                }
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Err(Error::invalid_entry(raw, "empty path"));
        }

        Ok(Self {
            inner: segments.join("/"),
        })
    }

    /// Build a key from a path relative to a category directory.
    ///
    /// Fails for names that are not valid UTF-8: a lossy key would no longer
    /// resolve to the file it came from.
    pub fn from_relative(path: &Path) -> Result<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(s) => match s.to_str() {
                    Some(s) => segments.push(s),
                    None => {
                        return Err(Error::invalid_entry(
                            path.to_string_lossy(),
                            "name is not valid UTF-8",
                        ));
                    }
                },
                Component::CurDir => continue,
                _ => {
                    return Err(Error::invalid_entry(
                        path.to_string_lossy(),
                        "not a plain relative path",
                    ));
                }
            }
        }
        Self::new(segments.join("/"))
    }

    /// Get the normalized string form.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Resolve this key below `root` as a native path.
    pub fn under(&self, root: &Path) -> PathBuf {
        self.inner.split('/').fold(root.to_path_buf(), |acc, s| acc.join(s))
    }

    /// The final path segment.
    pub fn file_name(&self) -> &str {
        self.inner.rsplit('/').next().unwrap_or(&self.inner)
    }

    /// The first path segment.
    pub fn first_segment(&self) -> &str {
        self.inner.split('/').next().unwrap_or(&self.inner)
    }

    /// The key with its first segment removed, if anything remains.
    pub fn strip_first_segment(&self) -> Option<Self> {
        let (_, rest) = self.inner.split_once('/')?;
        Some(Self {
            inner: rest.to_string(),
        })
    }
}

fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl AsRef<str> for EntryKey {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl TryFrom<String> for EntryKey {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for EntryKey {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl From<EntryKey> for String {
    fn from(key: EntryKey) -> Self {
        key.inner
    }
}

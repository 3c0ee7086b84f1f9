//! Archive sources
//!
//! The stager only needs two capabilities from an archive: list its entries
//! and extract one entry's bytes to a path. [`ArchiveSource`] captures that
//! seam; [`ZipArchiveSource`] is the production format and
//! [`DirectoryArchiveSource`] accepts an already unpacked tree.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use plugin_fs::EntryKey;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::{Error, Result};

const COPY_BUF_SIZE: usize = 64 * 1024;

/// One entry listed by an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Normalized path from the archive root, e.g. `bundled/p1.jar`
    pub path: EntryKey,
    pub is_dir: bool,
}

/// Read access to a plugins archive
pub trait ArchiveSource {
    /// Where the archive lives, for diagnostics
    fn location(&self) -> &Path;

    /// List every entry of the archive.
    ///
    /// # Errors
    ///
    /// [`Error::ArchiveUnreadable`] if the listing cannot be produced or an
    /// entry name would escape the archive root.
    fn entries(&mut self) -> Result<Vec<ArchiveEntry>>;

    /// Write the bytes of a file entry to `dest`, returning the byte count.
    ///
    /// # Errors
    ///
    /// [`Error::ArchiveUnreadable`] when reading the entry fails,
    /// [`Error::StagingIo`] when writing `dest` fails.
    fn extract(&mut self, entry: &ArchiveEntry, dest: &Path) -> Result<u64>;
}

/// Open the archive at `path`.
///
/// A directory is served as a [`DirectoryArchiveSource`]; anything else is
/// opened as a zip file.
pub fn open_archive(path: &Path) -> Result<Box<dyn ArchiveSource>> {
    if path.is_dir() {
        Ok(Box::new(DirectoryArchiveSource::new(path)))
    } else {
        Ok(Box::new(ZipArchiveSource::open(path)?))
    }
}

/// Copy `reader` into a new file at `dest`, classifying failures by side.
fn pump(reader: &mut dyn Read, source: &Path, dest: &Path) -> Result<u64> {
    let mut out = File::create(dest).map_err(|e| Error::staging(dest, e))?;
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).map_err(|e| Error::archive(source, e))?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])
            .map_err(|e| Error::staging(dest, e))?;
        total += n as u64;
    }
    out.flush().map_err(|e| Error::staging(dest, e))?;
    Ok(total)
}

/// A zip file holding `bundled/` and `external/` folders
pub struct ZipArchiveSource {
    path: PathBuf,
    archive: ZipArchive<File>,
    /// Normalized entry name to zip index; a later duplicate wins
    index: BTreeMap<EntryKey, (usize, bool)>,
}

impl std::fmt::Debug for ZipArchiveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipArchiveSource")
            .field("path", &self.path)
            .field("entries", &self.index.len())
            .finish()
    }
}

impl ZipArchiveSource {
    /// Open and index a zip archive.
    ///
    /// # Errors
    ///
    /// [`Error::ArchiveUnreadable`] if the file is missing, is not a zip, or
    /// contains an entry name that is absolute or climbs out with `..`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::archive(path, e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| Error::archive(path, e))?;

        let mut index = BTreeMap::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i).map_err(|e| Error::archive(path, e))?;
            let name = entry.name().to_string();
            let is_dir = entry.is_dir();
            let key = match EntryKey::new(&name) {
                Ok(key) => key,
                // Bare "./" style root entries carry nothing
                Err(plugin_fs::Error::InvalidEntryPath { .. }) if is_dir && is_root_name(&name) => {
                    continue;
                }
                Err(e) => return Err(Error::archive(path, e)),
            };
            index.insert(key, (i, is_dir));
        }

        tracing::debug!(
            archive = %path.display(),
            entries = index.len(),
            "Opened plugins archive"
        );

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            index,
        })
    }
}

fn is_root_name(name: &str) -> bool {
    name.split(['/', '\\']).all(|s| s.is_empty() || s == ".")
}

impl ArchiveSource for ZipArchiveSource {
    fn location(&self) -> &Path {
        &self.path
    }

    fn entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        Ok(self
            .index
            .iter()
            .map(|(key, (_, is_dir))| ArchiveEntry {
                path: key.clone(),
                is_dir: *is_dir,
            })
            .collect())
    }

    fn extract(&mut self, entry: &ArchiveEntry, dest: &Path) -> Result<u64> {
        let (i, _) = *self.index.get(&entry.path).ok_or_else(|| {
            Error::archive(&self.path, format!("no entry named {}", entry.path))
        })?;
        let mut file = self
            .archive
            .by_index(i)
            .map_err(|e| Error::archive(&self.path, e))?;
        pump(&mut file, &self.path, dest)
    }
}

/// An unpacked directory standing in for an archive
#[derive(Debug, Clone)]
pub struct DirectoryArchiveSource {
    root: PathBuf,
}

impl DirectoryArchiveSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArchiveSource for DirectoryArchiveSource {
    fn location(&self) -> &Path {
        &self.root
    }

    fn entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        if !self.root.is_dir() {
            return Err(Error::archive(&self.root, "not a directory"));
        }

        let mut entries = Vec::new();
        for item in WalkDir::new(&self.root).min_depth(1).sort_by_file_name() {
            let item = item.map_err(|e| Error::archive(&self.root, e))?;
            let relative = item
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| Error::archive(&self.root, e))?;
            let path = EntryKey::from_relative(relative).map_err(|e| Error::archive(&self.root, e))?;
            entries.push(ArchiveEntry {
                path,
                is_dir: item.file_type().is_dir(),
            });
        }
        Ok(entries)
    }

    fn extract(&mut self, entry: &ArchiveEntry, dest: &Path) -> Result<u64> {
        let source = entry.path.under(&self.root);
        let mut reader = fs::File::open(&source).map_err(|e| Error::archive(&source, e))?;
        pump(&mut reader, &source, dest)
    }
}

//! Archive Stager
//!
//! Extracts an archive into a fresh per-cycle staging tree that mirrors the
//! archive's category folders. Never touches the live plugin tree.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use plugin_fs::{PluginCategory, PluginLayout};
use tempfile::TempDir;

use crate::archive::ArchiveSource;
use crate::{Error, Result};

/// The extracted contents of one archive.
///
/// Backed by a temporary directory that is deleted when the tree is dropped,
/// so nothing staged for one cycle can leak into the next.
#[derive(Debug)]
pub struct StagedTree {
    dir: TempDir,
    categories: BTreeSet<PluginCategory>,
    files: usize,
    ignored: usize,
}

impl StagedTree {
    /// Root of the staging tree
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Staged directory of `category`, or `None` if the archive had no such folder.
    pub fn category_dir(&self, category: PluginCategory) -> Option<PathBuf> {
        self.categories
            .contains(&category)
            .then(|| PluginLayout::new(self.dir.path()).category_dir(category))
    }

    /// Number of files extracted into category folders
    pub fn staged_files(&self) -> usize {
        self.files
    }

    /// Number of archive entries outside any category folder
    pub fn ignored_entries(&self) -> usize {
        self.ignored
    }
}

/// Builds staging trees from archives
#[derive(Debug, Clone, Default)]
pub struct Stager {
    /// Parent for staging directories; the system temp dir when `None`
    staging_parent: Option<PathBuf>,
}

impl Stager {
    pub fn new(staging_parent: Option<PathBuf>) -> Self {
        Self { staging_parent }
    }

    fn create_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".plugin-stage-");
        match &self.staging_parent {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| Error::staging(parent, e))?;
                builder
                    .tempdir_in(parent)
                    .map_err(|e| Error::staging(parent, e))
            }
            None => builder
                .tempdir()
                .map_err(|e| Error::staging(std::env::temp_dir(), e)),
        }
    }

    /// Extract `source` into a fresh staging tree.
    ///
    /// Only entries below a category folder are extracted; nested paths are
    /// kept verbatim. Everything else is counted as ignored.
    ///
    /// # Errors
    ///
    /// - [`Error::ArchiveUnreadable`] if the archive cannot be listed or read
    /// - [`Error::StagingIo`] if the staging tree cannot be written
    pub fn stage(&self, source: &mut dyn ArchiveSource) -> Result<StagedTree> {
        let entries = source.entries()?;
        let dir = self.create_dir()?;
        let layout = PluginLayout::new(dir.path());

        let mut categories = BTreeSet::new();
        let mut files = 0;
        let mut ignored = 0;

        for entry in &entries {
            let Some(category) = PluginCategory::from_dir_name(entry.path.first_segment()) else {
                ignored += 1;
                continue;
            };

            let category_dir = layout.category_dir(category);
            let Some(relative) = entry.path.strip_first_segment() else {
                if entry.is_dir {
                    fs::create_dir_all(&category_dir)
                        .map_err(|e| Error::staging(&category_dir, e))?;
                    categories.insert(category);
                } else {
                    // A plain file named like a category is not a category folder
                    ignored += 1;
                }
                continue;
            };

            let dest = relative.under(&category_dir);
            if entry.is_dir {
                fs::create_dir_all(&dest).map_err(|e| Error::staging(&dest, e))?;
            } else {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent).map_err(|e| Error::staging(parent, e))?;
                }
                source.extract(entry, &dest)?;
                files += 1;
            }
            categories.insert(category);
        }

        tracing::info!(
            archive = %source.location().display(),
            staging = %dir.path().display(),
            files,
            ignored,
            "Staged plugins archive"
        );

        Ok(StagedTree {
            dir,
            categories,
            files,
            ignored,
        })
    }
}

//! Category layout of a plugin root
//!
//! A plugin root (live or staged) holds one subdirectory per category.

use std::path::{Path, PathBuf};

use crate::PluginCategory;

/// A plugin root and its category subdirectories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginLayout {
    root: PathBuf,
}

impl PluginLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the entries of `category`.
    pub fn category_dir(&self, category: PluginCategory) -> PathBuf {
        self.root.join(category.dir_name())
    }
}

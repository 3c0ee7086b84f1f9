//! Agent configuration
//!
//! Loaded from `agent.toml` (or `.json` / `.yaml`) through
//! [`plugin_fs::ConfigStore`]. Every field has a default, so a missing file
//! yields a usable configuration.

use std::path::{Path, PathBuf};

use plugin_fs::ConfigStore;
use serde::{Deserialize, Serialize};

use crate::engine::SyncOptions;
use crate::plan::CompareMode;
use crate::{Error, Result};

/// Default live plugin root
pub const DEFAULT_PLUGINS_DIR: &str = "plugins";

/// Default archive delivered by the server
pub const DEFAULT_ARCHIVE: &str = "agent-plugins.zip";

/// Suffix of the default lock file, which sits beside the plugin root
pub const LOCK_FILE_SUFFIX: &str = ".plugin-sync.lock";

/// Configuration of the plugin sync agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Live plugin root holding `bundled/` and `external/`
    pub plugins_dir: PathBuf,
    /// Archive with the authoritative plugin set
    pub archive: PathBuf,
    /// Parent directory for per-cycle staging trees
    pub staging_dir: Option<PathBuf>,
    /// How entry content is compared
    pub compare: CompareMode,
    /// Lock file for the single-flight guard
    pub lock_file: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            plugins_dir: PathBuf::from(DEFAULT_PLUGINS_DIR),
            archive: PathBuf::from(DEFAULT_ARCHIVE),
            staging_dir: None,
            compare: CompareMode::default(),
            lock_file: None,
        }
    }
}

impl AgentConfig {
    /// Load from `path`, falling back to defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = ConfigStore::new().load_or_default(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would let a cycle clobber its own inputs.
    pub fn validate(&self) -> Result<()> {
        if self.plugins_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "plugins_dir must not be empty".to_string(),
            });
        }
        if self.archive.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "archive must not be empty".to_string(),
            });
        }
        if self.archive == self.plugins_dir {
            return Err(Error::Config {
                message: format!(
                    "archive and plugins_dir both point at {}",
                    self.plugins_dir.display()
                ),
            });
        }
        if let Some(staging) = &self.staging_dir
            && staging.starts_with(&self.plugins_dir)
            && self.category_contains(staging)
        {
            return Err(Error::Config {
                message: format!(
                    "staging_dir {} lies inside a live category directory",
                    staging.display()
                ),
            });
        }
        Ok(())
    }

    fn category_contains(&self, path: &Path) -> bool {
        plugin_fs::PluginCategory::ALL
            .iter()
            .any(|c| path.starts_with(self.plugins_dir.join(c.dir_name())))
    }

    /// Path of the single-flight lock file.
    ///
    /// Defaults to `.<root name>.plugin-sync.lock` next to `plugins_dir`, so
    /// taking the lock never creates anything inside the plugin root.
    pub fn lock_path(&self) -> PathBuf {
        if let Some(lock) = &self.lock_file {
            return lock.clone();
        }
        let root_name = self
            .plugins_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.plugins_dir
            .with_file_name(format!(".{root_name}{LOCK_FILE_SUFFIX}"))
    }

    /// Engine options derived from this configuration
    pub fn sync_options(&self, dry_run: bool) -> SyncOptions {
        SyncOptions {
            dry_run,
            compare: self.compare,
            staging_dir: self.staging_dir.clone(),
        }
    }
}

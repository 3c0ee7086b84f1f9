//! [`AgentDir`]: a temporary agent working directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary directory laid out like an agent's working directory:
///
/// ```text
/// <root>/
///   agent-plugins.zip
///   plugins/
///     bundled/
///     external/
/// ```
pub struct AgentDir {
    temp_dir: TempDir,
}

impl Default for AgentDir {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Live plugin root
    pub fn plugins_dir(&self) -> PathBuf {
        self.root().join("plugins")
    }

    /// Default archive location
    pub fn archive_path(&self) -> PathBuf {
        self.root().join("agent-plugins.zip")
    }

    /// Write `content` at `path` relative to the plugin root.
    pub fn seed(&self, path: &str, content: impl AsRef<[u8]>) -> &Self {
        let target = self.plugins_dir().join(path);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, content).unwrap();
        self
    }

    pub fn seed_bundled(&self, name: &str, content: impl AsRef<[u8]>) -> &Self {
        self.seed(&format!("bundled/{name}"), content)
    }

    pub fn seed_external(&self, name: &str, content: impl AsRef<[u8]>) -> &Self {
        self.seed(&format!("external/{name}"), content)
    }

    /// Read a file relative to the plugin root.
    pub fn read(&self, path: &str) -> String {
        let full_path = self.plugins_dir().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Sorted `/`-separated paths of every file below `plugins/<category>`.
    pub fn list(&self, category: &str) -> Vec<String> {
        let mut out = Vec::new();
        collect_files(&self.plugins_dir().join(category), "", &mut out);
        out.sort();
        out
    }

    /// Every file below the plugin root with its bytes, for before/after comparisons.
    pub fn fingerprint(&self) -> BTreeMap<String, Vec<u8>> {
        let mut files = Vec::new();
        collect_files(&self.plugins_dir(), "", &mut files);
        files
            .into_iter()
            .map(|key| {
                let bytes = fs::read(self.plugins_dir().join(&key)).unwrap();
                (key, bytes)
            })
            .collect()
    }

    /// Set permission bits on `path` relative to the plugin root.
    #[cfg(unix)]
    pub fn chmod(&self, path: &str, mode: u32) -> &Self {
        use std::os::unix::fs::PermissionsExt;

        let full_path = self.plugins_dir().join(path);
        fs::set_permissions(&full_path, fs::Permissions::from_mode(mode)).unwrap();
        self
    }

    /// Assert that `path` (relative to the plugin root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, path: &str) {
        let full_path = self.plugins_dir().join(path);
        assert!(
            full_path.exists(),
            "Expected plugin to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the plugin root) does not exist.
    pub fn assert_not_exists(&self, path: &str) {
        let full_path = self.plugins_dir().join(path);
        assert!(
            !full_path.exists(),
            "Expected plugin NOT to exist: {}",
            full_path.display()
        );
    }
}

/// Whether this process is bound by permission bits.
///
/// False when running as root, where tests relying on a read-only or
/// unreadable directory have nothing to observe.
#[cfg(unix)]
pub fn permissions_enforced() -> bool {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let locked = temp.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
    let enforced = fs::write(locked.join("attempt"), "").is_err();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    enforced
}

fn collect_files(dir: &Path, prefix: &str, out: &mut Vec<String>) {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return;
    };
    for item in read_dir {
        let item = item.unwrap();
        let name = item.file_name().to_string_lossy().into_owned();
        let key = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        if item.file_type().unwrap().is_dir() {
            collect_files(&item.path(), &key, out);
        } else {
            out.push(key);
        }
    }
}

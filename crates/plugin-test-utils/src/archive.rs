//! [`PluginArchive`] builder for plugins archive fixtures.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Clone)]
enum Entry {
    Dir(String),
    File(String, Vec<u8>),
}

/// In-memory description of a plugins archive.
///
/// Entries are written in insertion order. Names are used verbatim, so a
/// fixture can carry hostile names such as `../escape.jar`.
///
/// # Example
///
/// ```rust,no_run
/// use plugin_test_utils::PluginArchive;
///
/// let zip = PluginArchive::standard()
///     .with_bundled("p1.jar", "SOME-NEW-CONTENT")
///     .write_zip(std::path::Path::new("/tmp/agent-plugins.zip"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PluginArchive {
    entries: Vec<Entry>,
}

impl PluginArchive {
    /// An archive with no entries at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shape a server produces: both category folders plus a filler file.
    pub fn standard() -> Self {
        Self::new()
            .with_dir("bundled")
            .with_dir("external")
            .with_file("dummy.txt", "filler")
    }

    /// Add a directory entry.
    pub fn with_dir(mut self, path: &str) -> Self {
        let name = path.trim_end_matches('/').to_string();
        if !self.has_dir(&name) {
            self.entries.push(Entry::Dir(name));
        }
        self
    }

    /// Add a file entry at `path` from the archive root.
    pub fn with_file(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.entries
            .push(Entry::File(path.to_string(), content.as_ref().to_vec()));
        self
    }

    /// Add `bundled/<name>`, creating the folder entry if needed.
    pub fn with_bundled(self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.with_dir("bundled")
            .with_file(&format!("bundled/{name}"), content)
    }

    /// Add `external/<name>`, creating the folder entry if needed.
    pub fn with_external(self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.with_dir("external")
            .with_file(&format!("external/{name}"), content)
    }

    fn has_dir(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, Entry::Dir(d) if d == name))
    }

    /// Write the archive as a zip file at `path` and return the path.
    pub fn write_zip(&self, path: &Path) -> PathBuf {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            match entry {
                Entry::Dir(name) => zip.add_directory(name.as_str(), options).unwrap(),
                Entry::File(name, content) => {
                    zip.start_file(name.as_str(), options).unwrap();
                    zip.write_all(content).unwrap();
                }
            }
        }
        zip.finish().unwrap();
        path.to_path_buf()
    }

    /// Write the archive as an unpacked directory tree at `path`.
    ///
    /// # Panics
    /// Panics on entry names that would escape `path`.
    pub fn write_dir(&self, path: &Path) -> PathBuf {
        fs::create_dir_all(path).unwrap();
        for entry in &self.entries {
            match entry {
                Entry::Dir(name) => {
                    assert!(!name.contains(".."), "unsafe fixture path: {name}");
                    fs::create_dir_all(path.join(name)).unwrap();
                }
                Entry::File(name, content) => {
                    assert!(!name.contains(".."), "unsafe fixture path: {name}");
                    let target = path.join(name);
                    fs::create_dir_all(target.parent().unwrap()).unwrap();
                    fs::write(target, content).unwrap();
                }
            }
        }
        path.to_path_buf()
    }
}

/// Write bytes at `path` that no zip reader accepts.
pub fn write_corrupt_zip(path: &Path) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"PK\x03\x04 this is not really a zip archive").unwrap();
    path.to_path_buf()
}

//! Error types for plugin-sync

use std::path::PathBuf;

use plugin_fs::{EntryKey, PluginCategory};

use crate::report::{AbortKind, EntryOp};

/// Result type for plugin-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in plugin-sync operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The archive could not be opened, parsed or read
    #[error("Archive {path} is unreadable: {message}")]
    ArchiveUnreadable { path: PathBuf, message: String },

    /// The staging tree could not be created or written
    #[error("Failed to build staging tree at {path}: {source}")]
    StagingIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single entry could not be scanned, removed or written in the live tree
    #[error("Failed to {op} {category}/{}: {source}", entry_label(.entry))]
    EntryIo {
        category: PluginCategory,
        entry: Option<EntryKey>,
        op: EntryOp,
        #[source]
        source: plugin_fs::Error,
    },

    /// Another cycle holds the single-flight guard
    #[error("A reconciliation cycle is already in progress (lock: {lock})")]
    CycleInProgress { lock: PathBuf },

    /// Invalid agent configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Filesystem error from plugin-fs
    #[error(transparent)]
    Fs(#[from] plugin_fs::Error),
}

fn entry_label(entry: &Option<EntryKey>) -> &str {
    entry.as_ref().map(EntryKey::as_str).unwrap_or("*")
}

impl Error {
    pub fn archive(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ArchiveUnreadable {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn staging(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StagingIo {
            path: path.into(),
            source,
        }
    }

    /// Which abort class this error belongs to, if it ends a cycle early.
    pub fn abort_kind(&self) -> Option<AbortKind> {
        match self {
            Self::ArchiveUnreadable { .. } => Some(AbortKind::ArchiveUnreadable),
            Self::StagingIo { .. } | Self::Fs(_) => Some(AbortKind::StagingIo),
            _ => None,
        }
    }
}

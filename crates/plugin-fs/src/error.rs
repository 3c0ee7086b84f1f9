//! Error types for plugin-fs

use std::path::PathBuf;

/// Result type for plugin-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in plugin-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid entry path '{path}': {reason}")]
    InvalidEntryPath { path: String, reason: String },

    #[error("Unknown plugin category: {name}")]
    UnknownCategory { name: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_entry(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEntryPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

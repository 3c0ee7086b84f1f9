//! Error types for plugin-agent

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from plugin-sync
    #[error(transparent)]
    Sync(#[from] plugin_sync::Error),

    /// Report serialization failed
    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),

    /// Logging could not be initialized
    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },
}

//! Shared test fixtures for the plugin sync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`archive`]: [`PluginArchive`] builder producing zip files or unpacked trees
//! - [`agent`]: [`AgentDir`] holding a live plugin root next to an archive

pub mod agent;
pub mod archive;

pub use agent::AgentDir;
#[cfg(unix)]
pub use agent::permissions_enforced;
pub use archive::PluginArchive;

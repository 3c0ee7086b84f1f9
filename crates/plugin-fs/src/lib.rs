//! Filesystem layer for the plugin sync agent
//!
//! Provides the category layout of a plugin root, normalized entry keys,
//! content checksums and the atomic I/O primitives the reconciler applies.

pub mod category;
pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use category::PluginCategory;
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use layout::PluginLayout;
pub use path::EntryKey;

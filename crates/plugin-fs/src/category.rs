//! The two plugin categories and their directory names.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A group of plugins reconciled independently of the other group.
///
/// The directory name is the same in the archive and under the live root,
/// so one value pairs the staged folder with the live folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginCategory {
    /// System-provided plugins shipped with the server (`bundled/`)
    Bundled,
    /// User-supplied plugins installed on the server (`external/`)
    External,
}

impl PluginCategory {
    /// All categories, in the order a cycle reconciles them.
    pub const ALL: [PluginCategory; 2] = [PluginCategory::Bundled, PluginCategory::External];

    /// Directory name of this category, both in the archive and on disk.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Bundled => "bundled",
            Self::External => "external",
        }
    }

    /// Map a top-level archive folder name to its category.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.dir_name() == name)
    }
}

impl AsRef<Path> for PluginCategory {
    fn as_ref(&self) -> &Path {
        Path::new(self.dir_name())
    }
}

impl AsRef<str> for PluginCategory {
    fn as_ref(&self) -> &str {
        self.dir_name()
    }
}

impl fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

impl FromStr for PluginCategory {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_dir_name(&s.to_lowercase()).ok_or_else(|| Error::UnknownCategory {
            name: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_names_round_trip() {
        for category in PluginCategory::ALL {
            assert_eq!(
                PluginCategory::from_dir_name(category.dir_name()),
                Some(category)
            );
        }
    }

    #[test]
    fn unknown_folder_is_not_a_category() {
        assert_eq!(PluginCategory::from_dir_name("dummy.txt"), None);
        assert_eq!(PluginCategory::from_dir_name("Bundled"), None);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("EXTERNAL".parse::<PluginCategory>().unwrap(), PluginCategory::External);
        assert!("plugins".parse::<PluginCategory>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&PluginCategory::Bundled).unwrap();
        assert_eq!(json, "\"bundled\"");
    }
}

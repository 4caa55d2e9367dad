//! Store configuration
//!
//! Supplied read-only by the embedding harness (the settings-provider
//! collaborator) when the coordinator is constructed. The core never
//! discovers the root folder or conflict policy itself.

use serde::{Deserialize, Serialize};
use snapstore_core::FileId;
use std::path::PathBuf;

/// What to do when two RECORD writes to the same key disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConflictPolicy {
    /// Keep the first write and log the losing one; no hard failure
    #[default]
    Lenient,
    /// Fail the second unequal write with `ConflictingWrite` so a human
    /// can reconcile the two values
    Strict,
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory that all snapshot files live under
    pub root_dir: PathBuf,
    /// File extension for snapshot files (no leading dot)
    pub extension: String,
    /// Policy for unequal duplicate writes within one run
    pub conflict_policy: ConflictPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("snapshots"),
            extension: "ss".to_string(),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Config rooted at `root_dir` with the remaining defaults
    pub fn rooted(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Self::default()
        }
    }

    /// Physical path of one snapshot file
    pub fn path_for(&self, id: &FileId) -> PathBuf {
        self.root_dir
            .join(format!("{}.{}", id.as_str(), self.extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.extension, "ss");
        assert_eq!(config.conflict_policy, ConflictPolicy::Lenient);
    }

    #[test]
    fn test_path_for() {
        let config = StoreConfig::rooted("/tmp/snaps");
        let path = config.path_for(&FileId::new("auth/login_tests"));
        assert_eq!(path, PathBuf::from("/tmp/snaps/auth/login_tests.ss"));
    }

    #[test]
    fn test_config_round_trips_through_serde() {
        let config = StoreConfig {
            root_dir: PathBuf::from("x"),
            extension: "snap".to_string(),
            conflict_policy: ConflictPolicy::Strict,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: StoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}

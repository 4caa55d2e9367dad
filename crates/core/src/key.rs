//! Key types for the snapshot store
//!
//! - [`FileId`]: identifies one physical snapshot file (one source unit's
//!   worth of tests), as a root-relative path without extension
//! - [`SnapshotKey`]: composite key within a file - a test identifier plus
//!   an optional suffix that disambiguates multiple snapshots per test

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one physical snapshot file
///
/// The store resolves this against the configured root directory and file
/// extension; the id itself carries neither.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(String);

impl FileId {
    /// Create a file id from a root-relative path (e.g. `"auth/login_tests"`)
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The root-relative path
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite key for one snapshot within a file
///
/// Renders as `test` or `test/suffix`. A test that takes several snapshots
/// gives each a distinct suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotKey {
    test: String,
    suffix: String,
}

impl SnapshotKey {
    /// Key for a test's single (or primary) snapshot
    pub fn new(test: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            suffix: String::new(),
        }
    }

    /// Key for an additional snapshot of the same test
    pub fn with_suffix(test: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            suffix: suffix.into(),
        }
    }

    /// The test identifier
    pub fn test(&self) -> &str {
        &self.test
    }

    /// The disambiguating suffix ("" for the primary snapshot)
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.suffix.is_empty() {
            write!(f, "{}", self.test)
        } else {
            write!(f, "{}/{}", self.test, self.suffix)
        }
    }
}

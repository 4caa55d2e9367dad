//! Run lifecycle hooks
//!
//! Test harnesses drive the store through this narrow trait instead of
//! holding the full [`SnapshotCoordinator`](crate::coordinator::SnapshotCoordinator)
//! API, so a harness integration only needs the three callbacks it
//! actually has natural places for.

use snapstore_core::{FileId, Result};
use tracing::debug;

use crate::coordinator::SnapshotCoordinator;

/// Callbacks a test harness invokes as a run progresses
///
/// `on_run_end` must be called exactly once after all tests finish; it is
/// where written files are reconciled and flushed. A harness that aborts
/// without calling it leaves every file on disk untouched.
pub trait RunLifecycle {
    /// A test is about to execute
    fn on_test_start(&self, file: &FileId, test: &str);

    /// A test finished (pass or fail)
    fn on_test_end(&self, file: &FileId, test: &str);

    /// The whole run finished; flush pending writes
    fn on_run_end(&self) -> Result<()>;
}

impl RunLifecycle for SnapshotCoordinator {
    fn on_test_start(&self, file: &FileId, test: &str) {
        debug!(target: "snapstore::store", file = %file, test, "Test started");
    }

    fn on_test_end(&self, file: &FileId, test: &str) {
        debug!(target: "snapstore::store", file = %file, test, "Test finished");
    }

    fn on_run_end(&self) -> Result<()> {
        self.finalize_run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use snapstore_core::{RunMode, Snapshot, SnapshotKey};

    #[test]
    fn test_on_run_end_flushes() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator =
            SnapshotCoordinator::new(RunMode::Record, StoreConfig::rooted(dir.path()));
        let file = FileId::new("suite");

        coordinator.on_test_start(&file, "test_case");
        coordinator
            .record_or_reconcile(&file, &SnapshotKey::new("test_case"), Snapshot::of("v"))
            .unwrap();
        coordinator.on_test_end(&file, "test_case");
        coordinator.on_run_end().unwrap();

        assert!(coordinator.config().path_for(&file).exists());
    }
}

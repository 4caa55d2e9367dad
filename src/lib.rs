//! snapstore - Snapshot storage backend for test harnesses
//!
//! snapstore is the storage side of snapshot testing: it owns the on-disk
//! snapshot files, the in-memory working state during a test run, and the
//! mismatch reports a harness surfaces when an assertion drifts.
//!
//! # Quick Start
//!
//! ```ignore
//! use snapstore::{FileId, RunLifecycle, RunMode, Snapshot, SnapshotCoordinator,
//!                 SnapshotKey, StoreConfig};
//!
//! // One coordinator per run, shared across test threads
//! let store = SnapshotCoordinator::new(RunMode::Record, StoreConfig::default());
//!
//! let file = FileId::new("login_tests");
//! let snapshot = Snapshot::of("{\"status\": 200}").with_facet("headers", "…");
//! store.record_or_reconcile(&file, &SnapshotKey::new("test_login"), snapshot)?;
//!
//! // After all tests: prune stale keys and flush atomically
//! store.on_run_end()?;
//! ```
//!
//! # Architecture
//!
//! The [`SnapshotCoordinator`] is the single arbiter of every read and
//! write during a run. Value types ([`Snapshot`], [`OrderedMap`]) and the
//! file format live in internal crates and are re-exported here - hosts
//! only depend on this facade.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export the public API from snapstore-engine
pub use snapstore_engine::*;

//! Storage engine for snapstore
//!
//! This crate implements the run-scoped storage coordinator:
//! - SnapshotCoordinator: per-file state, lazy load, reconcile, atomic flush
//! - StoreConfig / ConflictPolicy: read-only run configuration
//! - RunLifecycle: the narrow trait test harnesses drive the store through
//!
//! # Concurrency
//!
//! Per-file mutual exclusion only:
//! - DashMap registry of `Arc<Mutex<FileState>>` (no whole-store lock)
//! - One key-write is atomic with the touched-set update
//! - Physical I/O at most twice per file per run (load + flush)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod coordinator;
pub mod lifecycle;

pub use config::{ConflictPolicy, StoreConfig};
pub use coordinator::{FileLifecycle, SnapshotCoordinator};
pub use lifecycle::RunLifecycle;

pub use snapstore_core::{
    first_divergence, Divergence, Error, FileId, OrderedMap, Result, RunMode, Snapshot,
    SnapshotKey, SnapshotValue,
};
pub use snapstore_format::SnapshotFile;

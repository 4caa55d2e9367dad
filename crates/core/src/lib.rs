//! Core types for the snapstore snapshot-testing engine
//!
//! This crate defines the foundational types used throughout the system:
//! - OrderedMap: immutable, insertion-order-preserving container
//! - Snapshot / SnapshotValue: the expected-value record (subject + facets)
//! - FileId / SnapshotKey: addressing of snapshot files and entries
//! - RunMode: the process-wide RECORD/VERIFY switch
//! - Divergence / first_divergence: the mismatch reporter
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod diff;
pub mod error;
pub mod key;
pub mod mode;
pub mod ordered_map;
pub mod snapshot;

// Re-export commonly used types
pub use diff::{first_divergence, Divergence};
pub use error::{Error, Result};
pub use key::{FileId, SnapshotKey};
pub use mode::RunMode;
pub use ordered_map::OrderedMap;
pub use snapshot::{Snapshot, SnapshotValue};

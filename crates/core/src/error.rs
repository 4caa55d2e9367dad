//! Error types for snapstore
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::diff::Divergence;
use std::io;
use thiserror::Error;

/// Result type alias for snapstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the snapshot store
///
/// All errors are reported synchronously at the call site that triggered
/// them; none are retried. A mismatch is a definitional test failure, not
/// a transient fault.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (reading or writing snapshot files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Two entries in one snapshot file share a key
    #[error("duplicate snapshot key: {key}")]
    DuplicateKey {
        /// The key that appeared more than once
        key: String,
    },

    /// On-disk content could not be parsed
    ///
    /// Fatal to that file's operations (no partial recovery), but scoped to
    /// the one file - it does not abort the whole run.
    #[error("malformed snapshot file at line {line}: {problem}")]
    MalformedSnapshotFile {
        /// 1-based line number where parsing failed
        line: u64,
        /// What was wrong with the content
        problem: String,
    },

    /// A snapshot key starts with the reserved metadata prefix
    ///
    /// The prefix marks the file-level metadata header on disk; a snapshot
    /// stored under it could not be told apart from that header when the
    /// file is read back.
    #[error("snapshot key uses the reserved metadata prefix: {key}")]
    ReservedKey {
        /// The offending key
        key: String,
    },

    /// VERIFY requested a key that was never recorded
    #[error("no such snapshot: {key} - did you run in record mode first?")]
    SnapshotMissing {
        /// The missing key
        key: String,
    },

    /// Actual value differs from the persisted snapshot
    ///
    /// The primary user-visible failure. Carries the reporter's
    /// line/column divergence.
    #[error("snapshot mismatch for {key}: {diff}")]
    SnapshotMismatch {
        /// The key whose snapshot differed
        key: String,
        /// Location and rendering of the first divergence
        diff: Divergence,
    },

    /// Two RECORD writes to the same key disagree, under strict policy
    ///
    /// Carries the divergence between the kept (first-written) and the
    /// rejected value so the two can be reconciled by hand.
    #[error("conflicting writes to snapshot {key} within one run: {diff}")]
    ConflictingWrite {
        /// The key written twice with unequal values
        key: String,
        /// First divergence, kept value rendered as `-`, rejected as `+`
        diff: Divergence,
    },

    /// Internal-logic error (a broken precondition, not a user failure)
    #[error("internal error: {0}")]
    Internal(String),
}

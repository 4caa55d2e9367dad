//! Run mode
//!
//! One process-wide mode, RECORD or VERIFY, resolved by an external
//! collaborator (e.g. a build-tool flag) before the run starts and fixed
//! for its whole duration. The core only consumes the resolved mode; it is
//! handed to the coordinator at construction rather than read from ambient
//! global state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process-wide run mode, fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    /// (Re)compute and persist snapshots as ground truth
    Record,
    /// Compare computed values against persisted snapshots; fail on mismatch
    Verify,
}

impl RunMode {
    /// Whether this run is allowed to write snapshots
    pub fn is_record(self) -> bool {
        matches!(self, Self::Record)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record => write!(f, "record"),
            Self::Verify => write!(f, "verify"),
        }
    }
}

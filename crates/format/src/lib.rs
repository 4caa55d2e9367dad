//! On-disk text format for snapshot files
//!
//! This crate centralizes all serialization logic for the snapshot store.
//! Keeping the format separate from operational logic (how files are
//! coordinated and flushed) makes format evolution easier to manage.
//!
//! The format is UTF-8 text, line-oriented, and deterministic:
//! - `escape`: key and body-line escaping rules
//! - `reader`: the pull parser with positioned errors
//! - `writer`: entry serialization and the crash-safe atomic file writer
//! - `file`: [`SnapshotFile`] tying it together with the round-trip law

#![warn(missing_docs)]
#![warn(clippy::all)]

mod escape;
mod reader;
mod writer;

pub mod file;

pub use file::{SnapshotFile, FORMAT_METADATA, METADATA_PREFIX};
pub use writer::{serialize_facets, write_file_atomic};

//! Snapshot file serializer and crash-safe disk writer
//!
//! Serialization is deterministic: entries are emitted in map order, a
//! snapshot's subject before its facets, every body followed by exactly one
//! newline. The same logical content always produces byte-identical output,
//! so a one-entry change yields a minimal diff.
//!
//! # Crash Safety
//!
//! Physical writes use the write-fsync-rename pattern:
//! 1. Write to a temporary sibling (`.name.tmp`)
//! 2. fsync the temporary file
//! 3. Atomic rename to the final path
//! 4. fsync the parent directory
//!
//! Either the complete reconciled file exists or the previous one does -
//! a partial file is never visible.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use snapstore_core::{Result, Snapshot, SnapshotValue};

use crate::escape::{escape_body_line, escape_key};

/// Delimiter rendered for an empty key and facet, as produced when
/// serializing bare facet bodies for mismatch messages
const EMPTY_KEY_AND_FACET: &str = "╔═  ═╗\n";

/// Append one `╔═ key ═╗` entry (delimiter plus body) to `out`
pub(crate) fn write_entry(out: &mut String, key: &str, facet: Option<&str>, value: &SnapshotValue) {
    out.push_str("╔═ ");
    out.push_str(&escape_key(key));
    if let Some(facet) = facet {
        out.push('[');
        out.push_str(&escape_key(facet));
        out.push(']');
    }
    out.push_str(" ═╗");

    match value {
        SnapshotValue::Text(text) => {
            out.push('\n');
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push_str(&escape_body_line(line));
            }
        }
        SnapshotValue::Binary(bytes) => {
            out.push_str(&format!(" base64 length {}", bytes.len()));
            out.push('\n');
            out.push_str(&BASE64.encode(bytes));
        }
    }
    out.push('\n');
}

/// Serialize the named facets of one snapshot, subject included when `""`
/// is listed, for use in mismatch reports
///
/// The subject is rendered bare (its `╔═  ═╗` delimiter is stripped) so the
/// report starts with the payload itself; facets keep a `╔═ [name] ═╗`
/// delimiter so the reader can tell which facet diverged.
pub fn serialize_facets(snapshot: &Snapshot, names: &[&str]) -> String {
    let mut out = String::new();
    for name in names {
        if name.is_empty() {
            write_entry(&mut out, "", None, snapshot.subject());
        } else if let Some(value) = snapshot.subject_or_facet(name) {
            write_entry(&mut out, "", Some(name), value);
        }
    }

    let trimmed = out.strip_suffix('\n').unwrap_or(&out);
    match trimmed.strip_prefix(EMPTY_KEY_AND_FACET) {
        Some(bare) => bare.to_string(),
        None => trimmed.to_string(),
    }
}

/// Write `contents` to `path` atomically (write-fsync-rename)
///
/// Creates the parent directory if needed. An existing file at `path` is
/// replaced in one step; no partial write is ever visible.
///
/// # Errors
///
/// Returns the underlying I/O error if any step fails.
pub fn write_file_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "snapshot".to_string());
    let temp_path = parent.join(format!(".{file_name}.tmp"));

    let mut file = File::create(&temp_path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    let dir = File::open(parent)?;
    dir.sync_all()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapstore_core::Snapshot;

    #[test]
    fn test_write_entry_text() {
        let mut out = String::new();
        write_entry(&mut out, "my test", None, &SnapshotValue::text("hello\nworld"));
        assert_eq!(out, "╔═ my test ═╗\nhello\nworld\n");
    }

    #[test]
    fn test_write_entry_facet() {
        let mut out = String::new();
        write_entry(&mut out, "my test", Some("stdout"), &SnapshotValue::text("out"));
        assert_eq!(out, "╔═ my test[stdout] ═╗\nout\n");
    }

    #[test]
    fn test_write_entry_escapes_delimiter_lines() {
        let mut out = String::new();
        write_entry(
            &mut out,
            "k",
            None,
            &SnapshotValue::text("safe\n╔═ sneaky ═╗\n\\slashed"),
        );
        assert_eq!(out, "╔═ k ═╗\nsafe\n\\╔═ sneaky ═╗\n\\\\slashed\n");
    }

    #[test]
    fn test_write_entry_binary() {
        let mut out = String::new();
        write_entry(&mut out, "k", None, &SnapshotValue::binary(b"abc".to_vec()));
        assert_eq!(out, "╔═ k ═╗ base64 length 3\nYWJj\n");
    }

    #[test]
    fn test_serialize_facets_subject_bare() {
        let snap = Snapshot::of("the subject").with_facet("extra", "more");
        let rendered = serialize_facets(&snap, &["", "extra"]);
        assert_eq!(rendered, "the subject\n╔═ [extra] ═╗\nmore");
    }

    #[test]
    fn test_serialize_facets_skips_absent() {
        let snap = Snapshot::of("s");
        let rendered = serialize_facets(&snap, &["missing"]);
        assert_eq!(rendered, "");
    }

    #[test]
    fn test_write_file_atomic_no_temp_left() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unit.ss");

        write_file_atomic(&path, "╔═ k ═╗\nv\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "╔═ k ═╗\nv\n");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| n.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");
    }

    #[test]
    fn test_write_file_atomic_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unit.ss");

        write_file_atomic(&path, "first\n").unwrap();
        write_file_atomic(&path, "second\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
    }

    #[test]
    fn test_write_file_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep/nested/unit.ss");

        write_file_atomic(&path, "x\n").unwrap();
        assert!(path.exists());
    }
}

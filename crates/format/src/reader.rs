//! Line-oriented parser for the snapshot file format
//!
//! Pulls `(delimiter, body)` entries out of the raw text, reversing the
//! writer's key and body escaping. Errors carry the 1-based line number of
//! the offending content so a human can fix the file by hand.
//!
//! Structural interpretation (facet grouping, duplicate detection, the
//! metadata header) happens one layer up in [`crate::file`].

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use snapstore_core::{Error, Result, SnapshotValue};

use crate::escape::{split_key_facet, unescape_body_line, DELIMITER_CHAR};

const DELIMITER_OPEN: &str = "╔═ ";
const DELIMITER_CLOSE: &str = " ═╗";
const BINARY_TRAILER: &str = " base64 length ";

/// One raw entry pulled from a snapshot file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedEntry {
    /// Snapshot key (unescaped)
    pub key: String,
    /// Facet name, when the delimiter was `key[facet]`
    pub facet: Option<String>,
    /// Decoded payload
    pub value: SnapshotValue,
    /// 1-based line of the entry's delimiter, for error reporting upstream
    pub line: u64,
}

/// Decoded pieces of one delimiter line
struct Delimiter {
    key: String,
    facet: Option<String>,
    binary_len: Option<usize>,
}

fn malformed(line: u64, problem: impl Into<String>) -> Error {
    Error::MalformedSnapshotFile {
        line,
        problem: problem.into(),
    }
}

/// Parse a `╔═ key ═╗` line, optionally carrying a `key[facet]` facet
/// marker and a ` base64 length N` binary trailer
fn parse_delimiter(line: &str, line_no: u64) -> Result<Delimiter> {
    let rest = line
        .strip_prefix(DELIMITER_OPEN)
        .ok_or_else(|| malformed(line_no, "delimiter must start with `╔═ `"))?;

    // A key may itself contain ` ═╗`, so try each closing candidate until
    // the remainder is empty or a valid trailer.
    for (pos, _) in rest.match_indices(DELIMITER_CLOSE) {
        let content = &rest[..pos];
        let trailer = &rest[pos + DELIMITER_CLOSE.len()..];

        let binary_len = if trailer.is_empty() {
            None
        } else if let Some(len_text) = trailer.strip_prefix(BINARY_TRAILER) {
            match len_text.parse::<usize>() {
                Ok(len) => Some(len),
                Err(_) => continue,
            }
        } else {
            continue;
        };

        let (key, facet) = split_key_facet(content, line_no)?;
        return Ok(Delimiter {
            key,
            facet,
            binary_len,
        });
    }

    Err(malformed(line_no, "delimiter missing closing ` ═╗`"))
}

/// Pull every entry out of a snapshot file's text
///
/// # Errors
///
/// `MalformedSnapshotFile` when content precedes the first delimiter, a
/// delimiter cannot be decoded, or a base64 body is invalid or has the
/// wrong decoded length.
pub(crate) fn parse_entries(input: &str) -> Result<Vec<ParsedEntry>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let mut lines: Vec<&str> = input.split('\n').collect();
    if input.ends_with('\n') {
        // The writer terminates every body with a newline; drop the empty
        // artifact after the final one.
        lines.pop();
    }

    let mut entries = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line_no = (i + 1) as u64;
        if !lines[i].starts_with(DELIMITER_CHAR) {
            return Err(malformed(line_no, "content before first delimiter"));
        }
        let delimiter = parse_delimiter(lines[i], line_no)?;

        let body_start = i + 1;
        let mut body_end = body_start;
        while body_end < lines.len() && !lines[body_end].starts_with(DELIMITER_CHAR) {
            body_end += 1;
        }
        let body: String = lines[body_start..body_end]
            .iter()
            .map(|l| unescape_body_line(l))
            .collect::<Vec<&str>>()
            .join("\n");

        let value = match delimiter.binary_len {
            None => SnapshotValue::text(body),
            Some(expected_len) => {
                let bytes = BASE64
                    .decode(body.trim())
                    .map_err(|e| malformed(line_no, format!("invalid base64 body: {e}")))?;
                if bytes.len() != expected_len {
                    return Err(malformed(
                        line_no,
                        format!(
                            "base64 body decodes to {} bytes, delimiter says {expected_len}",
                            bytes.len()
                        ),
                    ));
                }
                SnapshotValue::binary(bytes)
            }
        };

        entries.push(ParsedEntry {
            key: delimiter.key,
            facet: delimiter.facet,
            value,
            line: line_no,
        });
        i = body_end;
    }

    Ok(entries)
}

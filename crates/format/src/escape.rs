//! Escaping for delimiter keys and payload bodies
//!
//! Keys live inside `╔═ key ═╗` delimiter lines, so brackets (which mark
//! facets), backslashes, newlines, and tabs are backslash-escaped. Payload
//! bodies are line-oriented: a line whose first character would make it
//! look like a delimiter (`╔`) - or like an escaped line (`\`) - gets one
//! `\` prefixed, and the reader strips exactly one. This keeps the
//! round-trip law intact for adversarial payload content while leaving
//! ordinary lines untouched.

use snapstore_core::{Error, Result};

/// First character of every delimiter line
pub(crate) const DELIMITER_CHAR: char = '╔';

/// Escape a key or facet name for embedding in a delimiter line
pub(crate) fn escape_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '[' => out.push_str("\\["),
            ']' => out.push_str("\\]"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_key`]
///
/// # Errors
///
/// Returns `MalformedSnapshotFile` on an unknown or dangling escape.
pub(crate) fn unescape_key(escaped: &str, line: u64) -> Result<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('[') => out.push('['),
            Some(']') => out.push(']'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => {
                return Err(Error::MalformedSnapshotFile {
                    line,
                    problem: format!("unknown key escape `\\{other}`"),
                })
            }
            None => {
                return Err(Error::MalformedSnapshotFile {
                    line,
                    problem: "dangling backslash in key".to_string(),
                })
            }
        }
    }
    Ok(out)
}

/// Split an escaped `key` or `key[facet]` delimiter payload
///
/// Scans escape-aware: a bracket inside a key is always written `\[`/`\]`,
/// so any unescaped bracket belongs to the facet syntax.
pub(crate) fn split_key_facet(escaped: &str, line: u64) -> Result<(String, Option<String>)> {
    let mut open = None;
    let mut close = None;
    let mut prev_backslashes = 0usize;
    for (idx, c) in escaped.char_indices() {
        let escaped_here = prev_backslashes % 2 == 1;
        match c {
            '\\' => prev_backslashes += 1,
            '[' if !escaped_here => {
                if open.is_some() {
                    return Err(Error::MalformedSnapshotFile {
                        line,
                        problem: "multiple unescaped `[` in delimiter".to_string(),
                    });
                }
                open = Some(idx);
                prev_backslashes = 0;
            }
            ']' if !escaped_here => {
                if close.is_some() {
                    return Err(Error::MalformedSnapshotFile {
                        line,
                        problem: "multiple unescaped `]` in delimiter".to_string(),
                    });
                }
                close = Some(idx);
                prev_backslashes = 0;
            }
            _ => prev_backslashes = 0,
        }
    }

    match (open, close) {
        (None, None) => Ok((unescape_key(escaped, line)?, None)),
        (Some(o), Some(c)) if c == escaped.len() - ']'.len_utf8() && o < c => {
            let key = unescape_key(&escaped[..o], line)?;
            let facet = unescape_key(&escaped[o + 1..c], line)?;
            Ok((key, Some(facet)))
        }
        _ => Err(Error::MalformedSnapshotFile {
            line,
            problem: "unbalanced facet brackets in delimiter".to_string(),
        }),
    }
}

/// Escape one payload body line for writing
pub(crate) fn escape_body_line(line: &str) -> String {
    if line.starts_with(DELIMITER_CHAR) || line.starts_with('\\') {
        format!("\\{line}")
    } else {
        line.to_string()
    }
}

/// Reverse [`escape_body_line`]: strip exactly one leading backslash
pub(crate) fn unescape_body_line(line: &str) -> &str {
    line.strip_prefix('\\').unwrap_or(line)
}

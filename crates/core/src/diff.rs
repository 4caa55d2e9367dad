//! Mismatch reporter
//!
//! Locates the first divergence between an expected and an actual text body
//! and renders it as a short `L<line>:C<column>` report with the two
//! differing lines. This is a locate-and-report primitive, not a full
//! multi-hunk diff: only the first divergence is reported.
//!
//! Line and column counters are driven by the *expected* stream: the line
//! counter increments (and the column resets to 1) on each newline consumed
//! from it. Both counters are 1-based and count code points.

use crate::error::{Error, Result};
use std::fmt;

/// Location and rendering of the first point where two texts differ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    /// 1-based line of the first differing code point
    pub line: u32,
    /// 1-based column of the first differing code point
    pub column: u32,
    /// The enclosing line in the expected text; `None` when one input is
    /// a strict prefix of the other
    pub expected_line: Option<String>,
    /// The enclosing line in the actual text; `None` in the prefix case
    pub actual_line: Option<String>,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}:C{}", self.line, self.column)?;
        if let (Some(expected), Some(actual)) = (&self.expected_line, &self.actual_line) {
            write!(f, "\n-{expected}\n+{actual}")?;
        }
        Ok(())
    }
}

/// Locate the first divergence between two unequal texts
///
/// # Errors
///
/// Returns `Error::Internal` if the inputs are equal - the caller has
/// already established inequality, so an equal pair here is a logic error
/// in the caller, not a user-facing mismatch.
pub fn first_divergence(expected: &str, actual: &str) -> Result<Divergence> {
    let mut line: u32 = 1;
    let mut column: u32 = 1;
    // Byte offset into the common prefix; identical in both strings for
    // as long as their code points match.
    let mut offset: usize = 0;

    let mut expected_chars = expected.chars();
    let mut actual_chars = actual.chars();

    loop {
        match (expected_chars.next(), actual_chars.next()) {
            (Some(e), Some(a)) if e == a => {
                offset += e.len_utf8();
                if e == '\n' {
                    line += 1;
                    column = 1;
                } else {
                    column += 1;
                }
            }
            (Some(_), Some(_)) => {
                return Ok(Divergence {
                    line,
                    column,
                    expected_line: Some(line_around(expected, offset).to_string()),
                    actual_line: Some(line_around(actual, offset).to_string()),
                });
            }
            // One string is a strict prefix of the other: report the
            // position one past the common prefix, with no line content.
            (None, Some(_)) | (Some(_), None) => {
                return Ok(Divergence {
                    line,
                    column,
                    expected_line: None,
                    actual_line: None,
                });
            }
            (None, None) => {
                return Err(Error::Internal(
                    "first_divergence called with equal inputs".to_string(),
                ));
            }
        }
    }
}

/// The full line enclosing `offset`: from the previous newline (exclusive)
/// to the next newline or end of string
fn line_around(text: &str, offset: usize) -> &str {
    let start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = text[offset..]
        .find('\n')
        .map_or(text.len(), |i| offset + i);
    &text[start..end]
}

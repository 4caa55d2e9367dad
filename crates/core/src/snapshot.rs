//! Snapshot value model
//!
//! A [`Snapshot`] is the immutable expected-value record for one test: a
//! subject payload plus a mapping of named facets (secondary payloads such
//! as stdout alongside a return value). Snapshots are created once per test
//! evaluation and never mutated; a "new" snapshot for an existing key is a
//! fresh value that either replaces or is compared against the old one.
//!
//! Equality is exact string/byte identity only. Numeric or semantic
//! tolerance is a concern of the layer calling into this store.

use crate::ordered_map::OrderedMap;

/// A single snapshot payload: UTF-8 text or opaque bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotValue {
    /// UTF-8 text, compared and stored line-by-line
    Text(String),
    /// Opaque bytes, stored base64-encoded
    Binary(Vec<u8>),
}

impl SnapshotValue {
    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Create a binary value
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Binary(bytes.into())
    }

    /// Whether this is a binary payload
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// The text payload, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Binary(_) => None,
        }
    }

    /// The raw bytes, if this is a binary value
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Self::Text(_) => None,
            Self::Binary(b) => Some(b),
        }
    }
}

impl From<&str> for SnapshotValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SnapshotValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for SnapshotValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

/// An immutable expected-value record: subject payload + named facets
#[derive(Debug, Clone)]
pub struct Snapshot {
    subject: SnapshotValue,
    facets: OrderedMap<String, SnapshotValue>,
}

impl Snapshot {
    /// Create a snapshot with no facets
    pub fn of(subject: impl Into<SnapshotValue>) -> Self {
        Self {
            subject: subject.into(),
            facets: OrderedMap::new(),
        }
    }

    /// Return a new snapshot with the facet added or overwritten
    ///
    /// The facet name must be non-empty; the empty name addresses the
    /// subject itself via [`Snapshot::subject_or_facet`].
    pub fn with_facet(&self, name: impl Into<String>, value: impl Into<SnapshotValue>) -> Self {
        Self {
            subject: self.subject.clone(),
            facets: self.facets.upsert(name.into(), value.into()),
        }
    }

    /// The primary payload
    pub fn subject(&self) -> &SnapshotValue {
        &self.subject
    }

    /// The facet map, in insertion order
    pub fn facets(&self) -> &OrderedMap<String, SnapshotValue> {
        &self.facets
    }

    /// Resolve the empty name to the subject, any other name to its facet
    pub fn subject_or_facet(&self, name: &str) -> Option<&SnapshotValue> {
        if name.is_empty() {
            Some(&self.subject)
        } else {
            self.facets.get(&name.to_string())
        }
    }
}

// Facet equality is key-for-key and order-insensitive; serialization stays
// order-preserving. Two snapshots recorded with facets in different order
// are the same logical value.
impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject
            && self.facets.len() == other.facets.len()
            && self
                .facets
                .iter()
                .all(|(name, value)| other.facets.get(name) == Some(value))
    }
}

impl Eq for Snapshot {}

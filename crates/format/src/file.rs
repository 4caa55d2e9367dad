//! SnapshotFile: one physical unit of persistence
//!
//! A snapshot file holds every snapshot for one source unit's worth of
//! tests, as an ordered key -> [`Snapshot`] map plus an optional metadata
//! header. The serialized form is a sequence of `╔═ key ═╗` entries in map
//! order, a snapshot's subject entry followed by its `╔═ key[facet] ═╗`
//! facet entries.
//!
//! Round-trip law: `SnapshotFile::parse(&file.serialize()) == file` for
//! every file, adversarial payloads included.

use snapstore_core::{Error, OrderedMap, Result, Snapshot, SnapshotValue};

use crate::reader::parse_entries;
use crate::writer::write_entry;

/// Reserved key prefix marking the file-level metadata entry
pub const METADATA_PREFIX: &str = "📷 ";

/// Default metadata written by this serializer (name, value)
pub const FORMAT_METADATA: (&str, &str) = ("format", "snapstore 1");

/// Ordered collection of snapshots for one source unit, plus the
/// serializer and parser for its on-disk text form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SnapshotFile {
    metadata: Option<(String, String)>,
    snapshots: OrderedMap<String, Snapshot>,
}

impl SnapshotFile {
    /// Create an empty file with the default format metadata
    pub fn new() -> Self {
        Self {
            metadata: Some((FORMAT_METADATA.0.to_string(), FORMAT_METADATA.1.to_string())),
            snapshots: OrderedMap::new(),
        }
    }

    /// Create an empty file with no metadata header
    pub fn bare() -> Self {
        Self {
            metadata: None,
            snapshots: OrderedMap::new(),
        }
    }

    /// The file-level metadata header, if present
    pub fn metadata(&self) -> Option<(&str, &str)> {
        self.metadata.as_ref().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// The key -> snapshot map, in serialization order
    pub fn snapshots(&self) -> &OrderedMap<String, Snapshot> {
        &self.snapshots
    }

    /// Look up one snapshot
    pub fn get(&self, key: &str) -> Option<&Snapshot> {
        self.snapshots.get(&key.to_string())
    }

    /// Number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether the file holds no snapshots
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Insert or replace a snapshot, keeping an existing key's position
    ///
    /// # Errors
    ///
    /// `ReservedKey` when the key starts with the metadata prefix; such a
    /// key would collide with the file-level header and break the
    /// round-trip law.
    pub fn upsert(&mut self, key: impl Into<String>, snapshot: Snapshot) -> Result<()> {
        let key = key.into();
        Self::reject_reserved(&key)?;
        self.snapshots = self.snapshots.upsert(key, snapshot);
        Ok(())
    }

    /// Insert-only; fails with `DuplicateKey` when the key exists
    ///
    /// # Errors
    ///
    /// `DuplicateKey` on a repeated key, `ReservedKey` on a key starting
    /// with the metadata prefix.
    pub fn insert(&mut self, key: impl Into<String>, snapshot: Snapshot) -> Result<()> {
        let key = key.into();
        Self::reject_reserved(&key)?;
        self.snapshots = self.snapshots.insert(key, snapshot)?;
        Ok(())
    }

    fn reject_reserved(key: &str) -> Result<()> {
        if key.starts_with(METADATA_PREFIX) {
            return Err(Error::ReservedKey {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Drop every snapshot whose key fails the predicate, preserving order
    pub fn retain_keys(&mut self, keep: impl FnMut(&String) -> bool) {
        self.snapshots = self.snapshots.retain_keys(keep);
    }

    /// Serialize to the on-disk text form
    ///
    /// Deterministic: map order, subject before facets, one newline after
    /// every body.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        if let Some((name, value)) = &self.metadata {
            write_entry(
                &mut out,
                &format!("{METADATA_PREFIX}{name}"),
                None,
                &SnapshotValue::text(value.clone()),
            );
        }
        for (key, snapshot) in self.snapshots.iter() {
            write_entry(&mut out, key, None, snapshot.subject());
            for (facet, value) in snapshot.facets().iter() {
                write_entry(&mut out, key, Some(facet), value);
            }
        }
        out
    }

    /// Parse the on-disk text form back into a file
    ///
    /// # Errors
    ///
    /// - `MalformedSnapshotFile`: undecodable delimiter, content before the
    ///   first delimiter, a facet entry that does not follow its subject,
    ///   or a misplaced/binary metadata entry
    /// - `DuplicateKey`: a key (or a facet within one key) appears twice
    pub fn parse(input: &str) -> Result<Self> {
        let entries = parse_entries(input)?;

        let mut file = Self::bare();
        let mut last_key: Option<String> = None;
        for (index, entry) in entries.into_iter().enumerate() {
            if entry.key.starts_with(METADATA_PREFIX) {
                if index != 0 || entry.facet.is_some() {
                    return Err(Error::MalformedSnapshotFile {
                        line: entry.line,
                        problem: "metadata entry must be the first entry".to_string(),
                    });
                }
                let value = match entry.value {
                    SnapshotValue::Text(text) => text,
                    SnapshotValue::Binary(_) => {
                        return Err(Error::MalformedSnapshotFile {
                            line: entry.line,
                            problem: "metadata entry cannot be binary".to_string(),
                        })
                    }
                };
                let name = entry.key[METADATA_PREFIX.len()..].to_string();
                file.metadata = Some((name, value));
                continue;
            }

            match entry.facet {
                None => {
                    file.insert(entry.key.clone(), Snapshot::of(entry.value))?;
                    last_key = Some(entry.key);
                }
                Some(facet) => {
                    // Facet entries must immediately follow their subject;
                    // this is what keeps serialization order reconstructible.
                    if last_key.as_deref() != Some(entry.key.as_str()) {
                        return Err(Error::MalformedSnapshotFile {
                            line: entry.line,
                            problem: format!(
                                "facet entry for `{}` does not follow its subject",
                                entry.key
                            ),
                        });
                    }
                    let snapshot = file
                        .get(&entry.key)
                        .cloned()
                        .ok_or_else(|| Error::MalformedSnapshotFile {
                            line: entry.line,
                            problem: format!("facet entry for unknown key `{}`", entry.key),
                        })?;
                    if snapshot.facets().contains_key(&facet) {
                        return Err(Error::DuplicateKey {
                            key: format!("{}[{}]", entry.key, facet),
                        });
                    }
                    file.upsert(entry.key, snapshot.with_facet(facet, entry.value))?;
                }
            }
        }
        Ok(file)
    }
}

//! Immutable, insertion-order-preserving associative container
//!
//! Every higher structure in the store (snapshot facets, the per-file
//! key -> snapshot mapping) is built on this map. Insertion order is
//! semantically significant: it determines serialization order, which in
//! turn determines the on-disk diff friendliness of snapshot files.
//!
//! Updates are purely functional. `insert`/`upsert`/`remove` return a new
//! map; holders of a prior reference never observe mutation. The backing
//! storage is an `Arc`-shared slice, so an un-modified map is cheap to
//! clone and safe to share across threads.
//!
//! Lookup is O(n). Files hold low hundreds to ~1000 entries, so a linear
//! scan beats the constant factors of a tree at this scale.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Immutable sequence of unique keys with associated values
///
/// Equal maps have identical key order and identical values; `PartialEq`
/// is deliberately order-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<K, V> {
    entries: Arc<Vec<(K, V)>>,
}

impl<K, V> OrderedMap<K, V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Vec::new()),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Iterate over keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }
}

impl<K: Eq + Clone, V: Clone> OrderedMap<K, V> {
    /// Look up a value by key
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether a key is present
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Insert-only: return a new map with the entry appended
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if the key is already present. Callers that
    /// want overwrite semantics use [`OrderedMap::upsert`] instead - the
    /// choice is always explicit.
    pub fn insert(&self, key: K, value: V) -> Result<Self>
    where
        K: fmt::Display,
    {
        if self.contains_key(&key) {
            return Err(Error::DuplicateKey {
                key: key.to_string(),
            });
        }
        let mut entries = self.entries.as_ref().clone();
        entries.push((key, value));
        Ok(Self {
            entries: Arc::new(entries),
        })
    }

    /// Upsert: overwrite in place (keeping the key's original position)
    /// if present, append otherwise
    pub fn upsert(&self, key: K, value: V) -> Self {
        let mut entries = self.entries.as_ref().clone();
        match entries.iter().position(|(k, _)| *k == key) {
            Some(idx) => entries[idx].1 = value,
            None => entries.push((key, value)),
        }
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Return a new map without the key; no-op when absent
    pub fn remove(&self, key: &K) -> Self {
        match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => {
                let mut entries = self.entries.as_ref().clone();
                entries.remove(idx);
                Self {
                    entries: Arc::new(entries),
                }
            }
            None => self.clone(),
        }
    }

    /// Keep only entries whose key satisfies the predicate, preserving order
    pub fn retain_keys(&self, mut keep: impl FnMut(&K) -> bool) -> Self {
        let entries: Vec<(K, V)> = self
            .entries
            .iter()
            .filter(|(k, _)| keep(k))
            .cloned()
            .collect();
        Self {
            entries: Arc::new(entries),
        }
    }
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> OrderedMap<String, i32> {
        OrderedMap::new()
            .insert("a".to_string(), 1)
            .unwrap()
            .insert("b".to_string(), 2)
            .unwrap()
            .insert("c".to_string(), 3)
            .unwrap()
    }

    #[test]
    fn test_empty() {
        let map: OrderedMap<String, i32> = OrderedMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.get(&"x".to_string()), None);
    }

    #[test]
    fn test_insert_preserves_order() {
        let map = abc();
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_insert_duplicate_fails() {
        let map = abc();
        let err = map.insert("b".to_string(), 99).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { key } if key == "b"));
    }

    #[test]
    fn test_upsert_keeps_position() {
        let map = abc().upsert("b".to_string(), 99);
        let entries: Vec<(&String, &i32)> = map.iter().collect();
        assert_eq!(entries[1], (&"b".to_string(), &99));
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_upsert_appends_new_key() {
        let map = abc().upsert("d".to_string(), 4);
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_prior_reference_unchanged() {
        let original = abc();
        let updated = original.upsert("b".to_string(), 99);
        let removed = original.remove(&"a".to_string());

        // No in-place mutation is ever observed by holders of a prior reference
        assert_eq!(original.get(&"b".to_string()), Some(&2));
        assert_eq!(original.len(), 3);
        assert_eq!(updated.get(&"b".to_string()), Some(&99));
        assert_eq!(removed.len(), 2);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let map = abc();
        let same = map.remove(&"zzz".to_string());
        assert_eq!(map, same);
    }

    #[test]
    fn test_retain_keys() {
        let map = abc().retain_keys(|k| k != "b");
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["a", "c"]);
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let ab = OrderedMap::new()
            .insert("a".to_string(), 1)
            .unwrap()
            .insert("b".to_string(), 2)
            .unwrap();
        let ba = OrderedMap::new()
            .insert("b".to_string(), 2)
            .unwrap()
            .insert("a".to_string(), 1)
            .unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_stress_thousand_entries() {
        let mut map: OrderedMap<String, usize> = OrderedMap::new();
        for i in 0..1000 {
            map = map.insert(format!("key-{i:04}"), i).unwrap();
        }
        assert_eq!(map.len(), 1000);
        assert_eq!(map.get(&"key-0500".to_string()), Some(&500));

        // Order tracks insertion, not key sort
        let first: Vec<&String> = map.keys().take(2).collect();
        assert_eq!(first, ["key-0000", "key-0001"]);
    }

    #[test]
    fn test_shared_across_threads() {
        use std::thread;

        let map = Arc::new(abc());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let map = Arc::clone(&map);
                thread::spawn(move || *map.get(&"c".to_string()).unwrap())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 3);
        }
    }
}

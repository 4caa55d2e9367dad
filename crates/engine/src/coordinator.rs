//! Snapshot coordinator: the single arbiter of all reads and writes to the
//! snapshot store during one test run
//!
//! Many independent test executions run as concurrent tasks sharing the
//! same physical files. The coordinator keeps one in-memory state per file
//! (the lazily-loaded [`SnapshotFile`] plus the set of keys touched this
//! run) behind a per-file mutex; that pair is the unit of mutual exclusion.
//! One key-write is atomic with respect to the touched-set and the pending
//! map - there is no whole-store lock.
//!
//! For a single key, the sequence of writes across threads is linearized
//! by the per-file lock, so conflict detection is deterministic under any
//! interleaving. Across different keys no ordering is promised.
//!
//! Physical I/O happens at most twice per file per run: one lazy load on
//! first access, one atomic flush in [`SnapshotCoordinator::finalize_run`].
//! An aborted run never calls `finalize_run`, so a partially-pruned file is
//! never visible on disk.

use std::fs;
use std::io;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use snapstore_core::{
    first_divergence, Divergence, Error, FileId, Result, RunMode, Snapshot, SnapshotKey,
};
use snapstore_format::{serialize_facets, write_file_atomic, SnapshotFile};
use tracing::{debug, info, warn};

use crate::config::{ConflictPolicy, StoreConfig};

/// Lifecycle of one physical file within a run
///
/// `UNTOUCHED -> LOADED -> (DIRTY)* -> FLUSHED`; files that are only ever
/// read stop at `Loaded` and are never rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLifecycle {
    /// Not yet accessed this run
    Untouched,
    /// Loaded from disk (or initialized empty), unmodified
    Loaded,
    /// At least one snapshot written this run
    Dirty,
    /// Reconciled and written to disk by `finalize_run`
    Flushed,
}

/// Per-file in-memory state; the unit of mutual exclusion
struct FileState {
    lifecycle: FileLifecycle,
    file: SnapshotFile,
    /// Keys written this run; everything else is pruned at finalize
    touched: FxHashSet<String>,
}

impl FileState {
    fn untouched() -> Self {
        Self {
            lifecycle: FileLifecycle::Untouched,
            file: SnapshotFile::bare(),
            touched: FxHashSet::default(),
        }
    }
}

/// Process-wide coordinator for one test run
///
/// Constructed once at run start with the resolved [`RunMode`] and
/// [`StoreConfig`]; both are immutable for the run's duration.
pub struct SnapshotCoordinator {
    mode: RunMode,
    config: StoreConfig,
    files: DashMap<FileId, Arc<Mutex<FileState>>>,
}

impl SnapshotCoordinator {
    /// Create a coordinator for one run
    pub fn new(mode: RunMode, config: StoreConfig) -> Self {
        Self {
            mode,
            config,
            files: DashMap::new(),
        }
    }

    /// The run's mode
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// The run's configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current lifecycle of one file (`Untouched` when never accessed)
    pub fn file_lifecycle(&self, id: &FileId) -> FileLifecycle {
        self.files
            .get(id)
            .map(|state| state.lock().lifecycle)
            .unwrap_or(FileLifecycle::Untouched)
    }

    fn state(&self, id: &FileId) -> Arc<Mutex<FileState>> {
        let entry = self
            .files
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(FileState::untouched())));
        Arc::clone(entry.value())
    }

    /// Load the physical file once per run; a missing file starts empty
    fn ensure_loaded(&self, state: &mut FileState, id: &FileId) -> Result<()> {
        if state.lifecycle != FileLifecycle::Untouched {
            return Ok(());
        }
        let path = self.config.path_for(id);
        state.file = match fs::read_to_string(&path) {
            Ok(text) => SnapshotFile::parse(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => SnapshotFile::new(),
            Err(e) => return Err(e.into()),
        };
        state.lifecycle = FileLifecycle::Loaded;
        debug!(
            target: "snapstore::store",
            file = %id,
            entries = state.file.len(),
            "Snapshot file loaded"
        );
        Ok(())
    }

    /// Return the stored snapshot for `key`
    ///
    /// # Errors
    ///
    /// `SnapshotMissing` if the key was never recorded; load errors
    /// (`Io`, `MalformedSnapshotFile`, `DuplicateKey`) on first access to
    /// a broken file.
    pub fn read_or_fail(&self, id: &FileId, key: &SnapshotKey) -> Result<Snapshot> {
        let state = self.state(id);
        let mut st = state.lock();
        self.ensure_loaded(&mut st, id)?;
        st.file
            .get(&key.to_string())
            .cloned()
            .ok_or_else(|| Error::SnapshotMissing {
                key: key.to_string(),
            })
    }

    /// Compare `actual` against the stored snapshot
    ///
    /// On inequality, only the facets that actually disagree (the subject
    /// included, plus facets present on one side only) are rendered into
    /// the mismatch report, and the first divergence between the two
    /// renderings is located.
    ///
    /// # Errors
    ///
    /// `SnapshotMismatch` carrying the divergence; `SnapshotMissing` if the
    /// key was never recorded.
    pub fn verify(&self, id: &FileId, key: &SnapshotKey, actual: &Snapshot) -> Result<()> {
        let expected = self.read_or_fail(id, key)?;
        if expected == *actual {
            return Ok(());
        }
        Err(Error::SnapshotMismatch {
            key: key.to_string(),
            diff: divergence_between(&expected, actual)?,
        })
    }

    /// Record a snapshot, reconciling duplicate writes within the run
    ///
    /// - First write of a key this run: inserted (replacing any stale disk
    ///   value) and marked touched.
    /// - Re-record with an equal snapshot: idempotent no-op.
    /// - Re-record with an unequal snapshot: governed by
    ///   [`ConflictPolicy`] - lenient keeps the first write and logs the
    ///   loser, strict fails with `ConflictingWrite`.
    ///
    /// # Errors
    ///
    /// `ConflictingWrite` under strict policy, carrying the divergence
    /// between the kept and the rejected value; `ReservedKey` when the key
    /// renders with the metadata prefix; `Internal` when called outside
    /// record mode; load errors on first access to a broken file.
    pub fn record_or_reconcile(
        &self,
        id: &FileId,
        key: &SnapshotKey,
        snapshot: Snapshot,
    ) -> Result<()> {
        if !self.mode.is_record() {
            return Err(Error::Internal(format!(
                "record_or_reconcile called in {} mode",
                self.mode
            )));
        }

        let state = self.state(id);
        let mut st = state.lock();
        self.ensure_loaded(&mut st, id)?;

        let composite = key.to_string();
        if !st.touched.contains(&composite) {
            st.file.upsert(composite.clone(), snapshot)?;
            st.touched.insert(composite);
            st.lifecycle = FileLifecycle::Dirty;
            debug!(target: "snapstore::store", file = %id, key = %key, "Snapshot recorded");
            return Ok(());
        }

        match st.file.get(&composite) {
            Some(prior) if *prior == snapshot => {
                debug!(
                    target: "snapstore::store",
                    file = %id,
                    key = %key,
                    "Equivalent duplicate write ignored"
                );
                Ok(())
            }
            Some(prior) => match self.config.conflict_policy {
                ConflictPolicy::Strict => Err(Error::ConflictingWrite {
                    diff: divergence_between(prior, &snapshot)?,
                    key: composite,
                }),
                ConflictPolicy::Lenient => {
                    warn!(
                        target: "snapstore::store",
                        file = %id,
                        key = %key,
                        "Conflicting duplicate write dropped (first write wins)"
                    );
                    Ok(())
                }
            },
            None => Err(Error::Internal(format!(
                "touched key {composite} missing from in-memory file"
            ))),
        }
    }

    /// Reconcile and flush every file written this run
    ///
    /// For each dirty file: keys never touched this run are pruned, then
    /// the file is serialized and written atomically exactly once (or
    /// deleted, when pruning leaves nothing). Files that were only read
    /// are never rewritten.
    ///
    /// # Errors
    ///
    /// The first I/O error encountered while flushing.
    pub fn finalize_run(&self) -> Result<()> {
        for entry in self.files.iter() {
            let id = entry.key();
            let mut st = entry.value().lock();
            if st.lifecycle != FileLifecycle::Dirty {
                continue;
            }

            let before = st.file.len();
            let touched = std::mem::take(&mut st.touched);
            st.file.retain_keys(|k| touched.contains(k));
            let pruned = before - st.file.len();
            st.touched = touched;

            let path = self.config.path_for(id);
            if st.file.is_empty() {
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                info!(target: "snapstore::store", file = %id, "Empty snapshot file removed");
            } else {
                write_file_atomic(&path, &st.file.serialize())?;
                info!(
                    target: "snapstore::store",
                    file = %id,
                    entries = st.file.len(),
                    pruned,
                    "Snapshot file flushed"
                );
            }
            st.lifecycle = FileLifecycle::Flushed;
        }
        Ok(())
    }
}

/// Render the first divergence between two unequal snapshots
///
/// Only the facets where the two disagree (the subject included, plus
/// facets present on one side only) are serialized into the compared
/// texts, sorted by name.
fn divergence_between(expected: &Snapshot, actual: &Snapshot) -> Result<Divergence> {
    let mut names: Vec<&str> = vec![""];
    names.extend(expected.facets().keys().map(String::as_str));
    names.extend(
        actual
            .facets()
            .keys()
            .filter(|k| !expected.facets().contains_key(k))
            .map(String::as_str),
    );
    names.retain(|n| expected.subject_or_facet(n) != actual.subject_or_facet(n));
    names.sort_unstable();

    let expected_text = serialize_facets(expected, &names);
    let actual_text = serialize_facets(actual, &names);
    first_divergence(&expected_text, &actual_text)
}

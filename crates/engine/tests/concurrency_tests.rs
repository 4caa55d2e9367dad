//! Multi-Threaded Coordinator Tests
//!
//! Validates per-file mutual exclusion: concurrent writers to one file,
//! concurrent writers across files, and deterministic conflict detection
//! under racing duplicate writes.

use std::sync::{Arc, Barrier};
use std::thread;

use snapstore_engine::{
    ConflictPolicy, Error, FileId, RunMode, Snapshot, SnapshotCoordinator, SnapshotKey,
    StoreConfig,
};
use tempfile::TempDir;

fn record_coordinator(dir: &TempDir) -> Arc<SnapshotCoordinator> {
    Arc::new(SnapshotCoordinator::new(
        RunMode::Record,
        StoreConfig::rooted(dir.path()),
    ))
}

// ============================================================================
// Distinct-Key Tests
// ============================================================================

/// Test: 8 threads record distinct keys into one file -> all persisted
#[test]
fn test_concurrent_distinct_keys_one_file() {
    let temp_dir = TempDir::new().unwrap();
    let coordinator = record_coordinator(&temp_dir);
    let file = FileId::new("shared_suite");

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let coordinator = Arc::clone(&coordinator);
            let barrier = Arc::clone(&barrier);
            let file = file.clone();
            thread::spawn(move || {
                barrier.wait();
                coordinator.record_or_reconcile(
                    &file,
                    &SnapshotKey::new(format!("case_{i}")),
                    Snapshot::of(format!("value {i}")),
                )
            })
        })
        .collect();

    for h in handles {
        assert!(h.join().unwrap().is_ok(), "Distinct-key write should succeed");
    }
    coordinator.finalize_run().unwrap();

    let verifier = Arc::new(SnapshotCoordinator::new(
        RunMode::Verify,
        StoreConfig::rooted(temp_dir.path()),
    ));
    for i in 0..8 {
        let stored = verifier
            .read_or_fail(&file, &SnapshotKey::new(format!("case_{i}")))
            .unwrap();
        assert_eq!(stored, Snapshot::of(format!("value {i}")));
    }
}

/// Test: threads hitting different files never contend on correctness
#[test]
fn test_concurrent_writes_across_files() {
    let temp_dir = TempDir::new().unwrap();
    let coordinator = record_coordinator(&temp_dir);

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let coordinator = Arc::clone(&coordinator);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let file = FileId::new(format!("suite_{i}"));
                for j in 0..16 {
                    coordinator
                        .record_or_reconcile(
                            &file,
                            &SnapshotKey::new(format!("case_{j}")),
                            Snapshot::of(format!("{i}:{j}")),
                        )
                        .unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    coordinator.finalize_run().unwrap();

    let verifier = SnapshotCoordinator::new(
        RunMode::Verify,
        StoreConfig::rooted(temp_dir.path()),
    );
    for i in 0..4 {
        let file = FileId::new(format!("suite_{i}"));
        for j in 0..16 {
            let stored = verifier
                .read_or_fail(&file, &SnapshotKey::new(format!("case_{j}")))
                .unwrap();
            assert_eq!(stored, Snapshot::of(format!("{i}:{j}")));
        }
    }
}

// ============================================================================
// Racing Duplicate-Write Tests
// ============================================================================

/// Test: two threads race an unequal write to one key under strict policy
/// -> exactly one wins, the other gets ConflictingWrite
#[test]
fn test_racing_conflict_strict_exactly_one_winner() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = StoreConfig::rooted(temp_dir.path());
    config.conflict_policy = ConflictPolicy::Strict;
    let coordinator = Arc::new(SnapshotCoordinator::new(RunMode::Record, config));
    let file = FileId::new("racy_suite");

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["first", "second"]
        .into_iter()
        .map(|value| {
            let coordinator = Arc::clone(&coordinator);
            let barrier = Arc::clone(&barrier);
            let file = file.clone();
            thread::spawn(move || {
                barrier.wait();
                coordinator.record_or_reconcile(
                    &file,
                    &SnapshotKey::new("contested"),
                    Snapshot::of(value),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let failures = results.iter().filter(|r| r.is_err()).count();
    assert_eq!(failures, 1, "Exactly one racing write should lose");
    let loser = results.into_iter().find_map(|r| r.err()).unwrap();
    match loser {
        Error::ConflictingWrite { key, diff } => {
            assert_eq!(key, "contested");
            // Whichever thread lost, the error shows both values
            assert!(diff.expected_line.is_some());
            assert!(diff.actual_line.is_some());
            assert_ne!(diff.expected_line, diff.actual_line);
        }
        other => panic!("expected ConflictingWrite, got {other:?}"),
    }
}

/// Test: equal racing writes are all idempotent no-ops
#[test]
fn test_racing_equal_writes_all_succeed() {
    let temp_dir = TempDir::new().unwrap();
    let coordinator = record_coordinator(&temp_dir);
    let file = FileId::new("idempotent_suite");

    let barrier = Arc::new(Barrier::new(4));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            let barrier = Arc::clone(&barrier);
            let file = file.clone();
            thread::spawn(move || {
                barrier.wait();
                coordinator.record_or_reconcile(
                    &file,
                    &SnapshotKey::new("same"),
                    Snapshot::of("identical value"),
                )
            })
        })
        .collect();

    for h in handles {
        assert!(h.join().unwrap().is_ok(), "Equal duplicate write should succeed");
    }
}

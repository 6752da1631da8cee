//! Guard-based locking across threads
//!
//! Exercises the RAII guard the way a transaction layer would use it:
//! two-phase style acquisition with scope-driven release.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use keylock::{ContentionMatrix, GuardState, LockGuard, LockManager, LockManagerConfig, RwMode};

fn manager() -> Arc<LockManager<u64, u64, RwMode>> {
    Arc::new(LockManager::new(
        ContentionMatrix::read_write(),
        LockManagerConfig::default().with_scan_interval(Duration::from_millis(10)),
    ))
}

#[test]
fn test_scoped_writer_hands_over_to_reader() {
    let manager = manager();

    let reader = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || {
            // Blocks until the writer's guard goes out of scope.
            let guard = LockGuard::new(&manager, 0, 2, RwMode::Read);
            guard.owns_lock()
        })
    };

    {
        let guard = LockGuard::new(&manager, 0, 1, RwMode::Write);
        assert!(guard.owns_lock());
        thread::sleep(Duration::from_millis(50));
    }

    assert!(reader.join().unwrap());
}

#[test]
fn test_guards_drive_deadlock_recovery() {
    let manager = manager();

    let barrier = Arc::new(std::sync::Barrier::new(2));
    let workers: Vec<_> = [(1u64, 0u64, 1u64), (2, 1, 0)]
        .into_iter()
        .map(|(txn, first, second)| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let held = LockGuard::new(&manager, first, txn, RwMode::Write);
                assert!(held.owns_lock());
                barrier.wait();

                // Cross-acquisition: one of the two guards comes back
                // denied, and dropping both releases only what was owned.
                let crossed = LockGuard::new(&manager, second, txn, RwMode::Write);
                crossed.state()
            })
        })
        .collect();

    let states: Vec<GuardState> = workers
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .collect();

    let denied = states
        .iter()
        .filter(|&&state| state == GuardState::Denied)
        .count();
    assert_eq!(denied, 1, "exactly one transaction is victimized");

    // Every lock was released through guard drops: all records are free.
    for record in [0u64, 1] {
        assert!(manager.lock(&record, 9, RwMode::Write));
        manager.unlock(&record, 9);
    }
}

//! Concurrency tests: per-parent mutual exclusion and cross-parent
//! independence.

use rulesync_engine::{
    KeyedMutex, LockRetention, MemorySnapshotStore, Reconciler, ReconcilerConfig,
};
use rulesync_model::multiset::set_eq;
use rulesync_testkit::prelude::*;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn concurrent_materialize_on_one_parent_keeps_both_rules() {
    let remote = Arc::new(RecordingRemote::with_delay(Duration::from_millis(10)));
    remote.inner().insert_parent(parent("tag-1"), Vec::new());
    let reconciler = reconciler_over(Arc::clone(&remote));
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        s.spawn(|| {
            barrier.wait();
            reconciler
                .materialize(&unit("tag-1", "a"), &[rule("X", true)])
                .unwrap();
        });
        s.spawn(|| {
            barrier.wait();
            reconciler
                .materialize(&unit("tag-1", "b"), &[rule("Y", false)])
                .unwrap();
        });
    });

    let rules = remote.inner().rules(&parent("tag-1")).unwrap();
    assert!(set_eq(&rules, &[rule("X", true), rule("Y", false)]));
    assert_eq!(remote.interleavings(&parent("tag-1")), 0);
}

#[test]
fn many_units_on_one_parent_never_lose_updates() {
    const UNITS: usize = 8;
    let remote = Arc::new(RecordingRemote::with_delay(Duration::from_millis(2)));
    remote.inner().insert_parent(parent("tag-1"), Vec::new());
    let reconciler = reconciler_over(Arc::clone(&remote));
    let barrier = Barrier::new(UNITS);

    thread::scope(|s| {
        for i in 0..UNITS {
            let reconciler = &reconciler;
            let barrier = &barrier;
            s.spawn(move || {
                let u = unit("tag-1", &format!("unit-{i}"));
                barrier.wait();
                reconciler
                    .materialize(&u, &[rule(&format!("K{i}"), true)])
                    .unwrap();
                reconciler
                    .reconcile(&u, &[rule(&format!("K{i}"), false)])
                    .unwrap();
            });
        }
    });

    let rules = remote.inner().rules(&parent("tag-1")).unwrap();
    let expected: Vec<_> = (0..UNITS).map(|i| rule(&format!("K{i}"), false)).collect();
    assert!(set_eq(&rules, &expected));
    assert_eq!(remote.interleavings(&parent("tag-1")), 0);
    assert!(reconciler.lock_registry().is_empty());
}

#[test]
fn blocked_parent_does_not_block_another() {
    let remote = Arc::new(GatedRemote::new());
    remote.inner().insert_parent(parent("tag-a"), Vec::new());
    remote.inner().insert_parent(parent("tag-b"), Vec::new());
    remote.close(&parent("tag-a"));
    let reconciler = reconciler_over(Arc::clone(&remote));

    thread::scope(|s| {
        let blocked = s.spawn(|| {
            reconciler.materialize(&unit("tag-a", "a"), &[rule("X", true)])
        });
        assert!(remote.wait_parked(&parent("tag-a"), Duration::from_secs(5)));
        assert!(reconciler.lock_registry().is_locked(&parent("tag-a")));

        // tag-a's critical section is stuck; tag-b must still complete
        reconciler
            .materialize(&unit("tag-b", "b"), &[rule("Y", true)])
            .unwrap();
        assert!(!blocked.is_finished());

        remote.open(&parent("tag-a"));
        blocked.join().unwrap().unwrap();
    });

    assert_eq!(
        remote.inner().rules(&parent("tag-a")).unwrap(),
        vec![rule("X", true)]
    );
    assert_eq!(
        remote.inner().rules(&parent("tag-b")).unwrap(),
        vec![rule("Y", true)]
    );
}

#[test]
fn blocked_parent_serializes_second_caller() {
    let remote = Arc::new(GatedRemote::new());
    remote.inner().insert_parent(parent("tag-a"), Vec::new());
    remote.close(&parent("tag-a"));
    let reconciler = reconciler_over(Arc::clone(&remote));

    thread::scope(|s| {
        let first = s.spawn(|| {
            reconciler.materialize(&unit("tag-a", "a"), &[rule("X", true)])
        });
        assert!(remote.wait_parked(&parent("tag-a"), Duration::from_secs(5)));

        let second = s.spawn(|| {
            reconciler.materialize(&unit("tag-a", "b"), &[rule("Y", true)])
        });
        thread::sleep(Duration::from_millis(50));
        // the second caller waits on the keyed lock, not inside fetch
        assert!(!second.is_finished());
        assert_eq!(remote.inner().fetch_count(), 0);

        remote.open(&parent("tag-a"));
        first.join().unwrap().unwrap();
        second.join().unwrap().unwrap();
    });

    let rules = remote.inner().rules(&parent("tag-a")).unwrap();
    assert!(set_eq(&rules, &[rule("X", true), rule("Y", true)]));
}

#[test]
fn reconcilers_sharing_a_registry_exclude_each_other() {
    let remote = Arc::new(RecordingRemote::with_delay(Duration::from_millis(5)));
    remote.inner().insert_parent(parent("tag-1"), Vec::new());
    let locks = Arc::new(KeyedMutex::new(LockRetention::Retain));
    let first = reconciler_over(Arc::clone(&remote)).with_lock_registry(Arc::clone(&locks));
    let second: Reconciler<_, _> =
        reconciler_over(Arc::clone(&remote)).with_lock_registry(Arc::clone(&locks));
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        s.spawn(|| {
            barrier.wait();
            first
                .materialize(&unit("tag-1", "a"), &[rule("X", true)])
                .unwrap();
        });
        s.spawn(|| {
            barrier.wait();
            second
                .materialize(&unit("tag-1", "b"), &[rule("Y", true)])
                .unwrap();
        });
    });

    assert_eq!(remote.interleavings(&parent("tag-1")), 0);
    assert_eq!(locks.len(), 1);
}

#[test]
fn waiting_for_the_lock_does_not_consume_the_request_timeout() {
    // each operation needs ~100 ms of remote time; queued behind another it
    // would be ~200 ms from its start, past the 160 ms timeout
    let remote = Arc::new(RecordingRemote::with_delay(Duration::from_millis(50)));
    remote.inner().insert_parent(parent("tag-1"), Vec::new());
    let reconciler = Reconciler::new(
        ReconcilerConfig::new().with_request_timeout(Duration::from_millis(160)),
        Arc::clone(&remote),
        Arc::new(MemorySnapshotStore::new()),
        test_credentials(),
    );
    let barrier = Barrier::new(2);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|id| {
                let reconciler = &reconciler;
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    reconciler.materialize(&unit("tag-1", id), &[rule(id, true)])
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in results {
        assert_eq!(result.unwrap().added, 1);
    }
    let rules = remote.inner().rules(&parent("tag-1")).unwrap();
    assert!(set_eq(&rules, &[rule("a", true), rule("b", true)]));
}

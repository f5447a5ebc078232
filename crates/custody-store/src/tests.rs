//! Concurrency tests for custody-store

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use custody_counters::Counter;
use proptest::prelude::*;
use test_case::test_case;

use crate::{
    KeyValueStore, LockedStateStore, Op, OwnedStateStore, StoreConfig, StoreError, Workload,
    replay,
};

fn start_with_journal(request_capacity: usize, journal_capacity: usize) -> OwnedStateStore {
    let config = StoreConfig::default()
        .with_request_capacity(request_capacity)
        .with_journal(journal_capacity);
    OwnedStateStore::start(config).unwrap()
}

// ============================================================================
// Serialization Through the Owner
// ============================================================================

#[test_case(0 ; "rendezvous channels")]
#[test_case(1 ; "one slot")]
#[test_case(64 ; "buffered channels")]
fn final_state_matches_journal_replay(request_capacity: usize) {
    const WRITERS: i64 = 8;
    const WRITES_PER_THREAD: i64 = 200;
    const KEYS: i64 = 5;

    let store = start_with_journal(request_capacity, 4096);

    thread::scope(|s| {
        for writer in 0..WRITERS {
            let handle = store.handle();
            s.spawn(move || {
                for i in 0..WRITES_PER_THREAD {
                    handle.put(i % KEYS, writer * 1000 + i).unwrap();
                    if i % 7 == 0 {
                        handle.get(i % KEYS).unwrap();
                    }
                }
            });
        }
    });

    let journal = store.journal().unwrap();
    assert_eq!(journal.evicted(), 0, "journal must hold every operation");
    let entries = journal.drain();

    // Sequence numbers are dense: the owner processed one request at a time.
    for (expected, entry) in entries.iter().enumerate() {
        assert_eq!(entry.seq, expected as u64);
    }

    let writes = entries
        .iter()
        .filter(|e| matches!(e.op, Op::Write { .. }))
        .count();
    assert_eq!(writes as i64, WRITERS * WRITES_PER_THREAD);

    let replayed = replay(&entries);
    for key in 0..KEYS {
        assert_eq!(store.get(key).unwrap(), replayed[&key], "key {key}");
    }
}

#[test]
fn reads_observe_latest_preceding_write() {
    let store = start_with_journal(16, 4096);

    thread::scope(|s| {
        for writer in 0..4 {
            let handle = store.handle();
            s.spawn(move || {
                for i in 0..100 {
                    handle.put(i % 3, writer * 100 + i).unwrap();
                }
            });
        }
        for _ in 0..4 {
            let handle = store.handle();
            s.spawn(move || {
                for i in 0..100 {
                    handle.get(i % 3).unwrap();
                }
            });
        }
    });

    // Walk the journal with a model map: each read must have returned what
    // the model held at that point in the owner's order.
    let mut model = HashMap::new();
    for entry in store.journal().unwrap().drain() {
        match entry.op {
            Op::Write { key, value } => {
                model.insert(key, value);
            }
            Op::Read { key, value } => {
                assert_eq!(model.get(&key).copied().unwrap_or(0), value);
            }
        }
    }
}

#[test]
fn workload_against_owned_store() {
    let store = OwnedStateStore::start(StoreConfig::default()).unwrap();
    let handle = store.handle();

    let workload = Workload {
        readers: 20,
        writers: 5,
        duration: Duration::from_millis(100),
        ..Workload::default()
    };
    let report = workload.run(&handle).unwrap();

    assert!(report.completed.reads > 0);
    assert!(report.completed.writes > 0);

    // Each completed call got exactly one reply from the owner.
    assert_eq!(store.counters().load(Counter::Reads), report.completed.reads);
    assert_eq!(
        store.counters().load(Counter::Writes),
        report.completed.writes
    );

    for key in 0..workload.key_space {
        let value = store.get(key).unwrap();
        assert!((0..workload.max_value).contains(&value));
    }
}

#[test]
fn both_strategies_agree_on_sequential_history() {
    fn apply(store: &dyn KeyValueStore) -> Vec<i64> {
        let mut seen = Vec::new();
        for i in 0..50 {
            store.put(i % 4, i * 3).unwrap();
            seen.push(store.get((i + 1) % 4).unwrap());
        }
        seen
    }

    let owned = OwnedStateStore::start(StoreConfig::default()).unwrap();
    let locked = LockedStateStore::new();

    assert_eq!(apply(&owned.handle()), apply(&locked));
}

// ============================================================================
// Shutdown
// ============================================================================

#[test]
fn shutdown_under_load_closes_every_caller() {
    let mut store = OwnedStateStore::start(StoreConfig::default().with_request_capacity(8)).unwrap();

    let callers: Vec<_> = (0..16)
        .map(|i| {
            let handle = store.handle();
            thread::spawn(move || {
                loop {
                    let result = if i % 2 == 0 {
                        handle.get(i).map(|_| ())
                    } else {
                        handle.put(i, i)
                    };
                    if let Err(err) = result {
                        return err;
                    }
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(20));
    store.shutdown();
    store.shutdown();

    for caller in callers {
        let err = caller.join().unwrap();
        assert!(matches!(err, StoreError::Closed), "unexpected {err}");
    }
}

#[test]
fn send_deadline_without_receiver_times_out() {
    // Nobody is receiving on the rendezvous channel.
    let (tx, _rx) = crossbeam_channel::bounded::<u32>(0);
    let deadline = std::time::Instant::now() + Duration::from_millis(10);
    let result = crate::Outbox::send_deadline(&tx, 1, deadline);
    assert!(matches!(result, Err(crate::SendFailure::Timeout(1))));
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[derive(Debug, Clone)]
enum Step {
    Get(i64),
    Put(i64, i64),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0i64..8).prop_map(Step::Get),
        (0i64..8, any::<i64>()).prop_map(|(k, v)| Step::Put(k, v)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: a single caller sees its own history as if the store were a
    /// plain map.
    #[test]
    fn prop_single_caller_matches_hashmap(steps in prop::collection::vec(step(), 0..64)) {
        let store = OwnedStateStore::start(StoreConfig::default()).unwrap();
        let mut model: HashMap<i64, i64> = HashMap::new();

        for step in steps {
            match step {
                Step::Get(key) => {
                    let expected = model.get(&key).copied().unwrap_or(0);
                    prop_assert_eq!(store.get(key).unwrap(), expected);
                }
                Step::Put(key, value) => {
                    store.put(key, value).unwrap();
                    model.insert(key, value);
                }
            }
        }
    }

    /// Property: the journal replay equals the store's final state for any
    /// single-caller write sequence.
    #[test]
    fn prop_replay_equals_final_state(
        writes in prop::collection::vec((0i64..4, any::<i64>()), 1..64),
    ) {
        let store = start_with_journal(0, 128);
        for &(key, value) in &writes {
            store.put(key, value).unwrap();
        }

        let replayed = replay(&store.journal().unwrap().drain());
        for (key, value) in replayed {
            prop_assert_eq!(store.get(key).unwrap(), value);
        }
    }
}

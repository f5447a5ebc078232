//! Mutex-guarded key/value store.
//!
//! The lock-based counterpart of [`OwnedStateStore`](crate::OwnedStateStore):
//! callers touch the map directly, one at a time, under a single `Mutex`.
//! Share it by reference or through an `Arc`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use custody_counters::{Counter, OperationCounters};

use crate::KeyValueStore;
use crate::error::StoreResult;

/// A key/value map behind one exclusive lock.
#[derive(Debug, Default)]
pub struct LockedStateStore {
    state: Mutex<HashMap<i64, i64>>,
    counters: Arc<OperationCounters>,
}

impl LockedStateStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored at `key`, or 0 if absent.
    pub fn get(&self, key: i64) -> i64 {
        let value = self.lock().get(&key).copied().unwrap_or_default();
        self.counters.increment(Counter::Reads);
        value
    }

    /// Stores `value` at `key`.
    pub fn put(&self, key: i64, value: i64) {
        self.lock().insert(key, value);
        self.counters.increment(Counter::Writes);
    }

    /// Copies the whole map, sorted by key.
    pub fn snapshot(&self) -> BTreeMap<i64, i64> {
        self.lock().iter().map(|(&k, &v)| (k, v)).collect()
    }

    /// Counts of reads and writes served.
    pub fn counters(&self) -> &Arc<OperationCounters> {
        &self.counters
    }

    // Every critical section is a single map call, so a panic cannot leave
    // the map half-updated and a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, HashMap<i64, i64>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for LockedStateStore {
    fn get(&self, key: i64) -> StoreResult<i64> {
        Ok(LockedStateStore::get(self, key))
    }

    fn put(&self, key: i64, value: i64) -> StoreResult<()> {
        LockedStateStore::put(self, key, value);
        Ok(())
    }
}

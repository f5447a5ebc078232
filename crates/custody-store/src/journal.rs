//! Serial log of the operations an owner thread has processed.
//!
//! Uses `crossbeam-queue::ArrayQueue` as a bounded, lock-free ring. The owner
//! is the only producer; readers drain it from any thread. When the ring is
//! full the oldest entry is overwritten and counted as evicted, so the owner
//! never blocks on a slow reader.
//!
//! # Sizing
//!
//! A journal can only be replayed if nothing was evicted. Size it for the
//! total number of operations a test issues, or drain it periodically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_queue::ArrayQueue;

/// A single operation as observed by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// A read of `key` that returned `value`.
    Read { key: i64, value: i64 },
    /// A write of `value` to `key`.
    Write { key: i64, value: i64 },
}

/// An operation tagged with its position in the owner's processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalEntry {
    /// Zero-based processing sequence number.
    pub seq: u64,
    pub op: Op,
}

/// A bounded, lock-free ring of [`JournalEntry`] values.
#[derive(Debug)]
pub struct Journal {
    inner: ArrayQueue<JournalEntry>,
    evicted: AtomicU64,
}

impl Journal {
    /// Creates a journal holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "journal capacity must be positive");
        Self {
            inner: ArrayQueue::new(capacity),
            evicted: AtomicU64::new(0),
        }
    }

    /// Appends an entry, overwriting the oldest one if the ring is full.
    ///
    /// Returns the overwritten entry, if any.
    pub fn record(&self, entry: JournalEntry) -> Option<JournalEntry> {
        let evicted = self.inner.force_push(entry);
        if evicted.is_some() {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        evicted
    }

    /// Removes and returns every entry currently held, oldest first.
    pub fn drain(&self) -> Vec<JournalEntry> {
        let mut entries = Vec::with_capacity(self.inner.len());
        while let Some(entry) = self.inner.pop() {
            entries.push(entry);
        }
        entries
    }

    /// Returns the number of entries lost to overwriting since creation.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Returns the number of entries currently held.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the journal holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the maximum number of entries held at once.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

/// Rebuilds the map a sequence of journal entries produces.
///
/// Reads are ignored; writes are applied in iteration order.
pub fn replay<'a>(entries: impl IntoIterator<Item = &'a JournalEntry>) -> HashMap<i64, i64> {
    let mut state = HashMap::new();
    for entry in entries {
        if let Op::Write { key, value } = entry.op {
            state.insert(key, value);
        }
    }
    state
}

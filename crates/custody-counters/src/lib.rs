//! Lock-free operation counters.
//!
//! Counters are plain `AtomicU64`s updated with `fetch_add`. They can be
//! shared between any number of threads without contending with the locks or
//! channels that protect the state they observe.
//!
//! ## Ordering
//!
//! - Increments of the same counter are sequentially consistent.
//! - No ordering is implied between different counters, or between a counter
//!   and the state it describes. A snapshot taken while writers are active is
//!   a set of independent loads, not an atomic cut.
//!
//! ## Usage
//!
//! ```
//! use custody_counters::{Counter, OperationCounters};
//!
//! let counters = OperationCounters::new();
//! counters.increment(Counter::Reads);
//! counters.add(Counter::Writes, 3);
//!
//! assert_eq!(counters.load(Counter::Reads), 1);
//! assert_eq!(counters.load(Counter::Writes), 3);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Identifies one of the counters in [`OperationCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Counter {
    /// Completed read operations.
    Reads,
    /// Completed write operations.
    Writes,
    /// Generic operations (neither a read nor a write).
    Ops,
}

impl Counter {
    /// All counters, in display order.
    pub const ALL: [Counter; 3] = [Counter::Reads, Counter::Writes, Counter::Ops];

    fn index(self) -> usize {
        match self {
            Counter::Reads => 0,
            Counter::Writes => 1,
            Counter::Ops => 2,
        }
    }

    /// Returns the counter's name as it appears in reports.
    pub fn name(self) -> &'static str {
        match self {
            Counter::Reads => "reads",
            Counter::Writes => "writes",
            Counter::Ops => "ops",
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fixed set of atomic counters.
///
/// All methods take `&self`; share the struct through an `Arc` or a
/// `static`.
#[derive(Debug)]
pub struct OperationCounters {
    slots: [AtomicU64; 3],
}

impl Default for OperationCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationCounters {
    /// Creates a set of counters, all at zero.
    ///
    /// This is a const function so counters can live in a `static`.
    pub const fn new() -> Self {
        Self {
            slots: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
        }
    }

    /// Adds one to `counter` and returns the previous value.
    pub fn increment(&self, counter: Counter) -> u64 {
        self.add(counter, 1)
    }

    /// Adds `n` to `counter` and returns the previous value.
    pub fn add(&self, counter: Counter, n: u64) -> u64 {
        self.slots[counter.index()].fetch_add(n, Ordering::SeqCst)
    }

    /// Reads the current value of `counter`.
    pub fn load(&self, counter: Counter) -> u64 {
        self.slots[counter.index()].load(Ordering::SeqCst)
    }

    /// Loads every counter.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            reads: self.load(Counter::Reads),
            writes: self.load(Counter::Writes),
            ops: self.load(Counter::Ops),
        }
    }

    /// Resets every counter to zero.
    ///
    /// Increments racing with the reset may or may not survive it.
    pub fn reset(&self) {
        for slot in &self.slots {
            slot.store(0, Ordering::SeqCst);
        }
    }
}

/// Point-in-time values of every counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub reads: u64,
    pub writes: u64,
    pub ops: u64,
}

impl CounterSnapshot {
    /// Returns the value recorded for `counter`.
    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Reads => self.reads,
            Counter::Writes => self.writes,
            Counter::Ops => self.ops,
        }
    }
}

impl fmt::Display for CounterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reads={} writes={} ops={}",
            self.reads, self.writes, self.ops
        )
    }
}

//! # Custody
//!
//! Two ways to give many threads safe access to shared mutable state, plus
//! the counters used to watch them.
//!
//! - **Ownership**: [`OwnedStateStore`] confines an integer map to one owner
//!   thread. Every other thread talks to it through request channels and
//!   waits on a single-use reply channel.
//! - **Locking**: [`LockedStateStore`] keeps the map behind a mutex, and
//!   [`QuorumWaiter`] pairs a mutex with a condition variable so a
//!   coordinator can sleep until enough voters have reported.
//! - **Atomics**: [`OperationCounters`] counts reads, writes and operations
//!   without taking any lock.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                            custody                            │
//! │  ┌────────────────┐  ┌────────────────┐  ┌─────────────────┐  │
//! │  │ custody-store  │  │ custody-quorum │  │ custody-counters│  │
//! │  │ owner thread + │  │ Mutex<Tally> + │  │  AtomicU64 x 3  │  │
//! │  │ Mutex<HashMap> │  │    Condvar     │  │                 │  │
//! │  └───────┬────────┘  └────────────────┘  └────────▲────────┘  │
//! │          └──────────── increments ────────────────┘           │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use custody::{OwnedStateStore, QuorumWaiter, StoreConfig, predicate};
//!
//! let mut store = OwnedStateStore::start(StoreConfig::default())?;
//! store.put(3, 42)?;
//! store.put(3, 99)?;
//! assert_eq!(store.get(3)?, 99);
//! store.shutdown();
//!
//! let waiter = QuorumWaiter::new(3)?;
//! waiter.report(true)?;
//! waiter.report(true)?;
//! let tally = waiter.await_until(predicate::at_least(2))?.release();
//! assert_eq!(tally.positive, 2);
//! # Ok::<(), custody::CustodyError>(())
//! ```

mod error;

pub use error::{CustodyError, Result};

// Atomic counters
pub use custody_counters::{Counter, CounterSnapshot, OperationCounters};

// Key/value stores
pub use custody_store::{
    Inbox, Journal, JournalEntry, KeyValueStore, LockedStateStore, Op, Outbox, OwnedStateStore,
    ReplyReceiver, ReplySender, SendFailure, StoreConfig, StoreError, StoreHandle, StoreResult,
    Workload, WorkloadReport, reply_channel, replay,
};

// Quorum waiting
pub use custody_quorum::{
    Decision, QuorumError, QuorumGuard, QuorumResult, QuorumWaiter, Tally, Verdict, hold_vote,
    predicate,
};

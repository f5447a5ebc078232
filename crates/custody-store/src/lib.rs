//! # custody-store: integer key/value stores for concurrent callers
//!
//! Two ways of sharing one mutable map between many threads:
//!
//! - [`OwnedStateStore`]: the map lives on a dedicated owner thread and is
//!   never touched by anyone else. Callers send read and write requests over
//!   channels and block on a single-use reply channel.
//! - [`LockedStateStore`]: the map sits behind one `Mutex` and callers lock
//!   it themselves.
//!
//! Both implement [`KeyValueStore`], so the same [`Workload`] can drive
//! either one.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  ReadRequest  ┌─────────────────────────────┐
//! │ StoreHandle  │ ────────────→ │        owner thread         │
//! │ (any thread) │  WriteRequest │  select! { reads, writes,   │
//! │              │ ────────────→ │            shutdown }       │
//! │              │ ←──────────── │  HashMap<i64, i64> (owned)  │
//! └──────────────┘  reply (cap 1)└─────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```
//! use custody_store::{OwnedStateStore, StoreConfig};
//!
//! let mut store = OwnedStateStore::start(StoreConfig::default())?;
//! store.put(3, 42)?;
//! store.put(3, 99)?;
//! assert_eq!(store.get(3)?, 99);
//!
//! store.shutdown();
//! assert!(store.get(3).is_err());
//! # Ok::<(), custody_store::StoreError>(())
//! ```

pub mod channel;
mod error;
pub mod journal;
mod locked;
mod owned;
#[cfg(test)]
mod tests;
pub mod workload;

pub use channel::{Inbox, Outbox, ReplyReceiver, ReplySender, SendFailure, reply_channel};
pub use error::{StoreError, StoreResult};
pub use journal::{Journal, JournalEntry, Op, replay};
pub use locked::LockedStateStore;
pub use owned::{OwnedStateStore, StoreConfig, StoreHandle};
pub use workload::{Workload, WorkloadReport};

/// Blocking get/put over integer keys and values.
///
/// Absent keys read as 0.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored at `key`, or 0 if absent.
    fn get(&self, key: i64) -> StoreResult<i64>;

    /// Stores `value` at `key`.
    fn put(&self, key: i64, value: i64) -> StoreResult<()>;
}

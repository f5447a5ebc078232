//! Single-owner key/value store.
//!
//! One dedicated thread owns the map for its whole lifetime. Every other
//! thread talks to it through a [`StoreHandle`], which turns `get` and `put`
//! into request messages carrying a single-use reply channel.
//!
//! # Design
//!
//! - Two request channels (reads, writes) plus a shutdown channel, multiplexed
//!   by `crossbeam_channel::select!` on the owner thread.
//! - The owner handles exactly one request per iteration. All operations are
//!   totally ordered as the owner processes them; a single caller's requests
//!   complete in the order it submitted them.
//! - When reads and writes are ready at the same time `select!` picks one at
//!   random. There is no priority and no explicit starvation guarantee.
//! - Replies go through capacity-1 channels, so a caller that stops waiting
//!   never stalls the owner.
//! - No locks guard the map.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, select};
use custody_counters::{Counter, OperationCounters};
use tracing::{debug, info, trace, warn};

use crate::channel::{Inbox, Outbox, ReplyReceiver, ReplySender, SendFailure, reply_channel};
use crate::error::{StoreError, StoreResult};
use crate::journal::{Journal, JournalEntry, Op};
use crate::KeyValueStore;

/// Configuration for an [`OwnedStateStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Capacity of each request channel. 0 makes every send a rendezvous
    /// with the owner.
    pub request_capacity: usize,
    /// Number of processed operations kept in the journal. 0 disables it.
    pub journal_capacity: usize,
    /// Name given to the owner thread.
    pub thread_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            request_capacity: 0,
            journal_capacity: 0,
            thread_name: "custody-owner".to_string(),
        }
    }
}

impl StoreConfig {
    /// Sets the request channel capacity.
    pub fn with_request_capacity(mut self, capacity: usize) -> Self {
        self.request_capacity = capacity;
        self
    }

    /// Enables the journal with room for `capacity` entries.
    pub fn with_journal(mut self, capacity: usize) -> Self {
        self.journal_capacity = capacity;
        self
    }
}

/// A read request: reply with the value stored at `key`.
#[derive(Debug)]
pub(crate) struct ReadRequest {
    key: i64,
    reply: ReplySender<i64>,
}

/// A write request: store `value` at `key`, then acknowledge.
#[derive(Debug)]
pub(crate) struct WriteRequest {
    key: i64,
    value: i64,
    reply: ReplySender<bool>,
}

/// Cloneable client side of an [`OwnedStateStore`].
///
/// Handles stay valid after the store shuts down; every request made through
/// them then fails with [`StoreError::Closed`].
#[derive(Debug, Clone)]
pub struct StoreHandle {
    reads: Sender<ReadRequest>,
    writes: Sender<WriteRequest>,
}

impl StoreHandle {
    /// Returns the value stored at `key`, or 0 if the key was never written.
    ///
    /// A stored 0 and an absent key are indistinguishable.
    pub fn get(&self, key: i64) -> StoreResult<i64> {
        self.submit_get(key)?.wait()
    }

    /// Stores `value` at `key` and waits for the owner to apply it.
    pub fn put(&self, key: i64, value: i64) -> StoreResult<()> {
        let applied = self.submit_put(key, value)?.wait()?;
        debug_assert!(applied, "owner acknowledges every write");
        Ok(())
    }

    /// Like [`get`](Self::get), but gives up after `timeout`.
    ///
    /// A timeout too large to express as a deadline waits without one.
    pub fn get_timeout(&self, key: i64, timeout: Duration) -> StoreResult<i64> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.get(key);
        };
        let (reply, pending) = reply_channel();
        submit_by(&self.reads, ReadRequest { key, reply }, deadline, timeout)?;
        pending.wait_deadline(deadline).map_err(|err| widen(err, timeout))
    }

    /// Like [`put`](Self::put), but gives up after `timeout`.
    ///
    /// A timed-out write may still be applied later.
    pub fn put_timeout(&self, key: i64, value: i64, timeout: Duration) -> StoreResult<()> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.put(key, value);
        };
        let (reply, pending) = reply_channel();
        submit_by(&self.writes, WriteRequest { key, value, reply }, deadline, timeout)?;
        pending
            .wait_deadline(deadline)
            .map(|_| ())
            .map_err(|err| widen(err, timeout))
    }

    /// Enqueues a read and returns without waiting for the reply.
    pub fn submit_get(&self, key: i64) -> StoreResult<ReplyReceiver<i64>> {
        let (reply, pending) = reply_channel();
        submit(&self.reads, ReadRequest { key, reply })?;
        Ok(pending)
    }

    /// Enqueues a write and returns without waiting for the acknowledgement.
    pub fn submit_put(&self, key: i64, value: i64) -> StoreResult<ReplyReceiver<bool>> {
        let (reply, pending) = reply_channel();
        submit(&self.writes, WriteRequest { key, value, reply })?;
        Ok(pending)
    }
}

impl KeyValueStore for StoreHandle {
    fn get(&self, key: i64) -> StoreResult<i64> {
        StoreHandle::get(self, key)
    }

    fn put(&self, key: i64, value: i64) -> StoreResult<()> {
        StoreHandle::put(self, key, value)
    }
}

fn submit<T>(outbox: &impl Outbox<T>, request: T) -> StoreResult<()> {
    outbox.send(request).map_err(|_| StoreError::Closed)
}

fn submit_by<T>(
    outbox: &impl Outbox<T>,
    request: T,
    deadline: Instant,
    timeout: Duration,
) -> StoreResult<()> {
    outbox
        .send_deadline(request, deadline)
        .map_err(|failure| match failure {
            SendFailure::Disconnected(_) => StoreError::Closed,
            SendFailure::Timeout(_) => StoreError::Timeout(timeout),
        })
}

/// Reports the caller's whole budget rather than what was left of it.
fn widen(err: StoreError, timeout: Duration) -> StoreError {
    match err {
        StoreError::Timeout(_) => StoreError::Timeout(timeout),
        other => other,
    }
}

/// A key/value store whose map is owned by a single thread.
///
/// # Lifecycle
///
/// 1. Create with `OwnedStateStore::start(config)`; the owner thread starts
///    with an empty map.
/// 2. Hand out [`StoreHandle`]s with `handle()`.
/// 3. Call `shutdown()` (or drop the store) to stop the owner and join it.
pub struct OwnedStateStore {
    handle: StoreHandle,
    shutdown: Option<Sender<()>>,
    owner: Option<thread::JoinHandle<()>>,
    counters: Arc<OperationCounters>,
    journal: Option<Arc<Journal>>,
}

impl OwnedStateStore {
    /// Spawns the owner thread and returns the running store.
    pub fn start(config: StoreConfig) -> StoreResult<Self> {
        let (reads_tx, reads_rx) = crossbeam_channel::bounded(config.request_capacity);
        let (writes_tx, writes_rx) = crossbeam_channel::bounded(config.request_capacity);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(0);

        let counters = Arc::new(OperationCounters::new());
        let journal = (config.journal_capacity > 0)
            .then(|| Arc::new(Journal::new(config.journal_capacity)));

        let owner = Owner {
            state: HashMap::new(),
            seq: 0,
            counters: Arc::clone(&counters),
            journal: journal.clone(),
        };

        let owner = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || owner.run(&reads_rx, &writes_rx, &shutdown_rx))?;

        debug!(
            request_capacity = config.request_capacity,
            journal_capacity = config.journal_capacity,
            "store owner started"
        );

        Ok(Self {
            handle: StoreHandle {
                reads: reads_tx,
                writes: writes_tx,
            },
            shutdown: Some(shutdown_tx),
            owner: Some(owner),
            counters,
            journal,
        })
    }

    /// Returns a new handle to this store.
    pub fn handle(&self) -> StoreHandle {
        self.handle.clone()
    }

    /// Reads `key` through the store's own handle.
    pub fn get(&self, key: i64) -> StoreResult<i64> {
        self.handle.get(key)
    }

    /// Writes `key` through the store's own handle.
    pub fn put(&self, key: i64, value: i64) -> StoreResult<()> {
        self.handle.put(key, value)
    }

    /// Counts of reads and writes the owner has served.
    pub fn counters(&self) -> &Arc<OperationCounters> {
        &self.counters
    }

    /// The owner's processing log, if enabled in the config.
    pub fn journal(&self) -> Option<&Arc<Journal>> {
        self.journal.as_ref()
    }

    /// Returns true until `shutdown()` has been called.
    pub fn is_running(&self) -> bool {
        self.owner.is_some()
    }

    /// Stops the owner thread and waits for it to exit.
    ///
    /// Requests still queued are dropped unanswered, so their callers get
    /// [`StoreError::Closed`], as does every later request. Safe to call
    /// multiple times (subsequent calls are no-ops).
    pub fn shutdown(&mut self) {
        // Dropping the only sender disconnects the owner's shutdown arm.
        drop(self.shutdown.take());

        if let Some(owner) = self.owner.take() {
            if owner.join().is_err() {
                warn!("store owner panicked");
            }
        }
    }
}

impl Drop for OwnedStateStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// State that lives on the owner thread.
struct Owner {
    state: HashMap<i64, i64>,
    seq: u64,
    counters: Arc<OperationCounters>,
    journal: Option<Arc<Journal>>,
}

impl Owner {
    fn run(
        mut self,
        reads: &Receiver<ReadRequest>,
        writes: &Receiver<WriteRequest>,
        shutdown: &Receiver<()>,
    ) {
        loop {
            select! {
                recv(reads) -> request => match request {
                    Ok(request) => self.read(request),
                    Err(_) => break,
                },
                recv(writes) -> request => match request {
                    Ok(request) => self.write(request),
                    Err(_) => break,
                },
                recv(shutdown) -> _ => break,
            }
        }

        let dropped = drain(reads) + drain(writes);
        info!(
            processed = self.seq,
            dropped,
            keys = self.state.len(),
            "store owner stopped"
        );
    }

    fn read(&mut self, ReadRequest { key, reply }: ReadRequest) {
        let value = self.state.get(&key).copied().unwrap_or_default();
        self.record(Op::Read { key, value });
        self.counters.increment(Counter::Reads);

        if !reply.send(value) {
            trace!(key, "read reply abandoned");
        }
    }

    fn write(&mut self, WriteRequest { key, value, reply }: WriteRequest) {
        self.state.insert(key, value);
        self.record(Op::Write { key, value });
        self.counters.increment(Counter::Writes);

        if !reply.send(true) {
            trace!(key, "write reply abandoned");
        }
    }

    fn record(&mut self, op: Op) {
        if let Some(journal) = &self.journal {
            journal.record(JournalEntry { seq: self.seq, op });
        }
        self.seq += 1;
    }
}

/// Drops every queued request. Their reply senders go with them, which
/// wakes each waiting caller with `Closed`.
fn drain<T>(inbox: &impl Inbox<T>) -> usize {
    let mut dropped = 0;
    while inbox.try_recv().is_some() {
        dropped += 1;
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> OwnedStateStore {
        OwnedStateStore::start(StoreConfig::default()).unwrap()
    }

    #[test]
    fn put_then_get() {
        let store = start();
        store.put(3, 42).unwrap();
        store.put(3, 99).unwrap();
        assert_eq!(store.get(3).unwrap(), 99);
    }

    #[test]
    fn absent_key_reads_zero() {
        let store = start();
        assert_eq!(store.get(12345).unwrap(), 0);

        store.put(7, 0).unwrap();
        assert_eq!(store.get(7).unwrap(), 0);
    }

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.request_capacity, 0);
        assert_eq!(config.journal_capacity, 0);
        assert_eq!(config.thread_name, "custody-owner");
    }

    #[test]
    fn journal_disabled_by_default() {
        let store = start();
        assert!(store.journal().is_none());
    }

    #[test]
    fn owner_counts_served_requests() {
        let store = start();
        store.put(1, 1).unwrap();
        store.put(2, 2).unwrap();
        store.get(1).unwrap();

        assert_eq!(store.counters().load(Counter::Writes), 2);
        assert_eq!(store.counters().load(Counter::Reads), 1);
    }

    #[test]
    fn journal_records_processing_order() {
        let store = OwnedStateStore::start(StoreConfig::default().with_journal(16)).unwrap();
        store.put(1, 10).unwrap();
        store.get(1).unwrap();
        store.put(1, 11).unwrap();

        let entries = store.journal().unwrap().drain();
        let ops: Vec<Op> = entries.iter().map(|e| e.op).collect();
        assert_eq!(
            ops,
            vec![
                Op::Write { key: 1, value: 10 },
                Op::Read { key: 1, value: 10 },
                Op::Write { key: 1, value: 11 },
            ]
        );
        assert_eq!(
            entries.iter().map(|e| e.seq).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn requests_after_shutdown_are_closed() {
        let mut store = start();
        let handle = store.handle();
        store.put(1, 1).unwrap();

        store.shutdown();
        assert!(!store.is_running());

        assert!(handle.get(1).unwrap_err().is_closed());
        assert!(handle.put(1, 2).unwrap_err().is_closed());
        assert!(handle.submit_get(1).unwrap_err().is_closed());
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut store = start();
        let handle = store.handle();

        store.shutdown();
        store.shutdown();

        assert!(handle.get(0).unwrap_err().is_closed());
        assert!(
            handle
                .get_timeout(0, Duration::from_millis(10))
                .unwrap_err()
                .is_closed()
        );
    }

    #[test]
    fn queued_requests_are_closed_on_shutdown() {
        let mut store =
            OwnedStateStore::start(StoreConfig::default().with_request_capacity(64)).unwrap();
        let handle = store.handle();

        // Shut down first, then make sure nothing queued afterwards hangs.
        store.shutdown();
        for key in 0..8 {
            match handle.submit_get(key) {
                Ok(pending) => assert!(pending.wait().unwrap_err().is_closed()),
                Err(err) => assert!(err.is_closed()),
            }
        }
    }

    #[test]
    fn drop_joins_owner() {
        let store = start();
        let handle = store.handle();
        drop(store);

        assert!(handle.get(0).unwrap_err().is_closed());
    }

    #[test]
    fn abandoned_request_does_not_stall_owner() {
        let store = start();
        let handle = store.handle();

        // Submit and walk away without reading the reply.
        drop(handle.submit_put(5, 50).unwrap());
        drop(handle.submit_get(5).unwrap());

        // The owner is still serving.
        assert_eq!(handle.get(5).unwrap(), 50);
    }

    #[test]
    fn timeout_variants_succeed_on_live_store() {
        let store = start();
        let handle = store.handle();
        let budget = Duration::from_secs(5);

        handle.put_timeout(9, 90, budget).unwrap();
        assert_eq!(handle.get_timeout(9, budget).unwrap(), 90);
    }

    #[test]
    fn unbounded_timeout_waits_without_deadline() {
        let store = start();
        let handle = store.handle();

        handle.put_timeout(2, 20, Duration::MAX).unwrap();
        assert_eq!(handle.get_timeout(2, Duration::MAX).unwrap(), 20);
    }

    /// A handle wired to channels nobody serves yet, plus the receivers an
    /// owner can be started on later.
    fn detached(
        request_capacity: usize,
    ) -> (StoreHandle, Receiver<ReadRequest>, Receiver<WriteRequest>) {
        let (reads, reads_rx) = crossbeam_channel::bounded(request_capacity);
        let (writes, writes_rx) = crossbeam_channel::bounded(request_capacity);
        (StoreHandle { reads, writes }, reads_rx, writes_rx)
    }

    #[test]
    fn get_timeout_expires_while_owner_is_unavailable() {
        let (handle, _reads, _writes) = detached(0);
        let budget = Duration::from_millis(20);

        let err = handle.get_timeout(1, budget).unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(err, StoreError::Timeout(t) if t == budget));
    }

    #[test]
    fn timed_out_write_is_applied_once_owner_catches_up() {
        let (handle, reads, writes) = detached(1);
        let budget = Duration::from_millis(20);

        // The write is queued but nobody replies before the deadline.
        let err = handle.put_timeout(4, 40, budget).unwrap_err();
        assert!(matches!(err, StoreError::Timeout(t) if t == budget));

        let counters = Arc::new(OperationCounters::new());
        let owner = Owner {
            state: HashMap::new(),
            seq: 0,
            counters: Arc::clone(&counters),
            journal: None,
        };
        let (shutdown, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let owner = thread::spawn(move || owner.run(&reads, &writes, &shutdown_rx));

        // Writes share one FIFO channel, so this put lands after the
        // timed-out one.
        handle.put(5, 50).unwrap();
        assert_eq!(handle.get(4).unwrap(), 40);
        assert_eq!(counters.load(Counter::Writes), 2);

        drop(shutdown);
        owner.join().unwrap();
    }

    #[test]
    fn same_caller_requests_complete_in_order() {
        let store = start();
        let handle = store.handle();

        let first = handle.submit_put(4, 1).unwrap();
        let second = handle.submit_put(4, 2).unwrap();
        assert!(first.wait().unwrap());
        assert!(second.wait().unwrap());

        assert_eq!(handle.get(4).unwrap(), 2);
    }
}

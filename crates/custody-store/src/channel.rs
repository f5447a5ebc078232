//! Directional channel endpoints and single-use reply channels.
//!
//! [`Outbox`] and [`Inbox`] narrow a channel to one direction at an API
//! boundary: a function that takes `&impl Outbox<T>` can only send, one that
//! takes `&impl Inbox<T>` can only receive. Both are implemented for the
//! `crossbeam-channel` endpoints.
//!
//! [`reply_channel`] creates the pair used for every store request. The
//! channel always has capacity 1, so the owner's reply never blocks even if
//! the requester has given up and dropped its [`ReplyReceiver`].

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};

use crate::error::{StoreError, StoreResult};

/// Reasons a send through an [`Outbox`] did not go through.
///
/// The unsent item is handed back to the caller.
#[derive(Debug, PartialEq, Eq)]
pub enum SendFailure<T> {
    /// Every receiver is gone.
    Disconnected(T),
    /// The deadline passed while the channel was full.
    Timeout(T),
}

impl<T> SendFailure<T> {
    /// Returns the item that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            Self::Disconnected(item) | Self::Timeout(item) => item,
        }
    }
}

/// The sending half of a channel, with receiving stripped away.
pub trait Outbox<T> {
    /// Sends `item`, blocking while the channel is full.
    fn send(&self, item: T) -> Result<(), SendFailure<T>>;

    /// Sends `item`, blocking at most until `deadline`.
    fn send_deadline(&self, item: T, deadline: Instant) -> Result<(), SendFailure<T>>;
}

/// The receiving half of a channel, with sending stripped away.
pub trait Inbox<T> {
    /// Blocks until an item arrives. Returns `None` once every sender is gone
    /// and the channel is empty.
    fn recv(&self) -> Option<T>;

    /// Returns an item if one is ready right now.
    fn try_recv(&self) -> Option<T>;
}

impl<T> Outbox<T> for Sender<T> {
    fn send(&self, item: T) -> Result<(), SendFailure<T>> {
        Sender::send(self, item).map_err(|err| SendFailure::Disconnected(err.into_inner()))
    }

    fn send_deadline(&self, item: T, deadline: Instant) -> Result<(), SendFailure<T>> {
        Sender::send_deadline(self, item, deadline).map_err(|err| match err {
            SendTimeoutError::Timeout(item) => SendFailure::Timeout(item),
            SendTimeoutError::Disconnected(item) => SendFailure::Disconnected(item),
        })
    }
}

impl<T> Inbox<T> for Receiver<T> {
    fn recv(&self) -> Option<T> {
        Receiver::recv(self).ok()
    }

    fn try_recv(&self) -> Option<T> {
        Receiver::try_recv(self).ok()
    }
}

/// Creates a connected single-use reply pair with a one-slot buffer.
pub fn reply_channel<T>() -> (ReplySender<T>, ReplyReceiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (ReplySender { inner: tx }, ReplyReceiver { inner: rx })
}

/// Write side of a reply channel. Consumed by [`ReplySender::send`].
#[derive(Debug)]
pub struct ReplySender<T> {
    inner: Sender<T>,
}

impl<T> ReplySender<T> {
    /// Delivers the reply without blocking.
    ///
    /// Returns `false` if the requester already dropped its receiver.
    pub fn send(self, value: T) -> bool {
        // The one slot is always free: the sender is consumed by this call.
        self.inner.try_send(value).is_ok()
    }
}

/// Read side of a reply channel: a request that is still in flight.
///
/// Dropping it abandons the request. The owner still processes the request
/// and its reply is discarded.
#[derive(Debug)]
pub struct ReplyReceiver<T> {
    inner: Receiver<T>,
}

impl<T> ReplyReceiver<T> {
    /// Blocks until the reply arrives.
    ///
    /// Returns [`StoreError::Closed`] if the owner dropped the request
    /// without replying, which only happens when it is shutting down.
    pub fn wait(self) -> StoreResult<T> {
        self.inner.recv().map_err(|_| StoreError::Closed)
    }

    /// Blocks for at most `timeout`.
    pub fn wait_timeout(self, timeout: Duration) -> StoreResult<T> {
        self.inner.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => StoreError::Timeout(timeout),
            RecvTimeoutError::Disconnected => StoreError::Closed,
        })
    }

    /// Blocks until `deadline`.
    pub fn wait_deadline(self, deadline: Instant) -> StoreResult<T> {
        let timeout = deadline.saturating_duration_since(Instant::now());
        self.wait_timeout(timeout)
    }

    /// Returns the reply if it has already arrived.
    pub fn try_take(&self) -> Option<T> {
        self.inner.try_recv().ok()
    }

    /// Exposes the underlying receiver so callers can race the reply against
    /// their own channels in a `crossbeam_channel::select!`.
    pub fn receiver(&self) -> &Receiver<T> {
        &self.inner
    }
}

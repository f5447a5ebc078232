//! Store error types.

use std::time::Duration;

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur when talking to a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The owner thread has stopped; the request was not applied.
    #[error("store is closed")]
    Closed,

    /// No reply arrived before the caller's deadline.
    ///
    /// The request may still be applied by the owner after this is returned.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The owner thread could not be spawned.
    #[error("failed to spawn owner thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl StoreError {
    /// Returns true if this is a `Closed` error.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns true if this is a `Timeout` error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

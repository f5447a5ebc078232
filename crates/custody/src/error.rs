//! Top-level error type.

use thiserror::Error;

use custody_quorum::QuorumError;
use custody_store::StoreError;

/// Result type for code that mixes stores and quorum waiters.
pub type Result<T> = std::result::Result<T, CustodyError>;

/// Any error raised by a custody component.
#[derive(Debug, Error)]
pub enum CustodyError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Quorum(#[from] QuorumError),
}

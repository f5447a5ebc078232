//! Quorum error types.

use std::time::Duration;

use thiserror::Error;

use crate::Tally;

/// Result type for quorum operations.
pub type QuorumResult<T> = Result<T, QuorumError>;

/// Errors that can occur while collecting or awaiting votes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuorumError {
    /// A waiter needs at least one voter.
    #[error("voter count must be positive, got {0}")]
    InvalidVoterCount(usize),

    /// Every configured voter has already reported.
    #[error("all {voters} voters have already reported")]
    Overreported { voters: usize },

    /// Every voter reported and the predicate still does not hold, so it
    /// never will.
    #[error("predicate cannot hold: all voters reported with tally {tally}")]
    Unsatisfiable { tally: Tally },

    /// The predicate did not hold before the deadline.
    #[error("timed out after {timeout:?} with tally {tally}")]
    Timeout { timeout: Duration, tally: Tally },
}

impl QuorumError {
    /// Returns the tally observed when the wait ended, if any.
    pub fn tally(&self) -> Option<Tally> {
        match self {
            Self::Unsatisfiable { tally } | Self::Timeout { tally, .. } => Some(*tally),
            Self::InvalidVoterCount(_) | Self::Overreported { .. } => None,
        }
    }
}

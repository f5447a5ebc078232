//! Common termination predicates for [`QuorumWaiter::await_until`].
//!
//! [`QuorumWaiter::await_until`]: crate::QuorumWaiter::await_until

use crate::Tally;

/// Holds once at least `k` positive reports have landed.
pub fn at_least(k: usize) -> impl Fn(&Tally) -> bool + Copy {
    move |tally| tally.positive >= k
}

/// Holds once all `n` voters have reported, whatever they voted.
pub fn all_reported(n: usize) -> impl Fn(&Tally) -> bool + Copy {
    move |tally| tally.total == n
}

/// Holds once the outcome against threshold `k` is known: either `k`
/// positive reports landed or all `n` voters reported.
pub fn decided(k: usize, n: usize) -> impl Fn(&Tally) -> bool + Copy {
    move |tally| tally.positive >= k || tally.total == n
}

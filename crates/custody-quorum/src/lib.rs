//! # custody-quorum: wait for a quorum of concurrent reports
//!
//! `N` voter threads each report one boolean outcome. A coordinator blocks
//! until a predicate over the running tally holds (for example "at least K
//! positive" or "everyone has reported") and then reads a consistent tally.
//!
//! The waiter is a `Mutex<Tally>` paired with a `Condvar`:
//!
//! - [`QuorumWaiter::report`] updates the tally and broadcasts while holding
//!   the lock.
//! - [`QuorumWaiter::await_until`] sleeps on the condition variable, which
//!   releases the lock while asleep and re-acquires it on wake, and re-checks
//!   the predicate every time it wakes.
//!
//! There is no polling loop: a coordinator that is waiting uses no CPU.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use custody_quorum::{QuorumWaiter, Verdict, predicate};
//!
//! let waiter = Arc::new(QuorumWaiter::new(10)?);
//!
//! for i in 0..10 {
//!     let waiter = Arc::clone(&waiter);
//!     thread::spawn(move || waiter.report(i % 3 != 0));
//! }
//!
//! let guard = waiter.await_until(predicate::decided(5, 10))?;
//! assert_eq!(guard.verdict(5), Verdict::Won);
//! drop(guard);
//! # Ok::<(), custody_quorum::QuorumError>(())
//! ```

mod error;
pub mod predicate;
mod tally;
mod vote;
mod waiter;

pub use error::{QuorumError, QuorumResult};
pub use tally::{Tally, Verdict};
pub use vote::{Decision, hold_vote};
pub use waiter::{QuorumGuard, QuorumWaiter};

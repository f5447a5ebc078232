//! The quorum waiter: one mutex, one condition variable, broadcast wake-up.
//!
//! Voters call [`QuorumWaiter::report`]. Each report updates the tally and
//! wakes every waiter while the lock is still held. A coordinator calls
//! [`QuorumWaiter::await_until`], which sleeps on the condition variable and
//! re-checks its predicate after every wake-up. A wake-up only means the
//! tally changed, not that the predicate holds.

use std::ops::Deref;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{QuorumError, QuorumResult};
use crate::Tally;

/// Collects one report from each of `N` voters and lets coordinators block
/// until a predicate over the running [`Tally`] holds.
#[derive(Debug)]
pub struct QuorumWaiter {
    voters: usize,
    tally: Mutex<Tally>,
    changed: Condvar,
}

impl QuorumWaiter {
    /// Creates a waiter expecting `voters` reports.
    pub fn new(voters: usize) -> QuorumResult<Self> {
        if voters == 0 {
            return Err(QuorumError::InvalidVoterCount(voters));
        }
        Ok(Self {
            voters,
            tally: Mutex::new(Tally::default()),
            changed: Condvar::new(),
        })
    }

    /// Number of voters this waiter expects.
    pub fn voters(&self) -> usize {
        self.voters
    }

    /// Records one voter's outcome and wakes every waiter.
    ///
    /// Returns the tally right after this report. Fails with
    /// [`QuorumError::Overreported`] once all voters have reported; the tally
    /// is left untouched in that case.
    pub fn report(&self, outcome: bool) -> QuorumResult<Tally> {
        let mut tally = self.lock();
        if tally.total == self.voters {
            return Err(QuorumError::Overreported {
                voters: self.voters,
            });
        }

        tally.record(outcome);
        debug_assert!(tally.positive <= tally.total && tally.total <= self.voters);
        trace!(outcome, tally = %*tally, "vote reported");

        // Broadcast before the guard is dropped.
        self.changed.notify_all();
        Ok(*tally)
    }

    /// Blocks until `predicate` holds for the tally.
    ///
    /// The predicate only ever sees the tally under the lock, and is
    /// re-evaluated after every wake-up. On success the returned guard still
    /// holds the lock, so the tally read through it is exactly the one that
    /// satisfied the predicate. Reporters block until the guard is dropped.
    ///
    /// Fails with [`QuorumError::Unsatisfiable`] if every voter has reported
    /// and the predicate still does not hold.
    pub fn await_until<P>(&self, mut predicate: P) -> QuorumResult<QuorumGuard<'_>>
    where
        P: FnMut(&Tally) -> bool,
    {
        let guard = self.lock();
        let guard = self
            .changed
            .wait_while(guard, |tally| !predicate(&*tally) && tally.total < self.voters)
            .unwrap_or_else(PoisonError::into_inner);

        self.finish(guard, &mut predicate, None)
    }

    /// Like [`await_until`](Self::await_until), but gives up after `timeout`.
    pub fn await_timeout<P>(
        &self,
        mut predicate: P,
        timeout: Duration,
    ) -> QuorumResult<QuorumGuard<'_>>
    where
        P: FnMut(&Tally) -> bool,
    {
        let guard = self.lock();
        let (guard, _) = self
            .changed
            .wait_timeout_while(guard, timeout, |tally| {
                !predicate(&*tally) && tally.total < self.voters
            })
            .unwrap_or_else(PoisonError::into_inner);

        self.finish(guard, &mut predicate, Some(timeout))
    }

    /// Returns the current tally without waiting.
    pub fn tally(&self) -> Tally {
        *self.lock()
    }

    /// Returns true once every voter has reported.
    pub fn is_complete(&self) -> bool {
        self.lock().total == self.voters
    }

    fn finish<'a, P>(
        &'a self,
        guard: MutexGuard<'a, Tally>,
        predicate: &mut P,
        timeout: Option<Duration>,
    ) -> QuorumResult<QuorumGuard<'a>>
    where
        P: FnMut(&Tally) -> bool,
    {
        let tally = *guard;
        if predicate(&tally) {
            debug!(%tally, voters = self.voters, "quorum predicate satisfied");
            return Ok(QuorumGuard { guard });
        }
        match timeout {
            Some(timeout) if tally.total < self.voters => {
                Err(QuorumError::Timeout { timeout, tally })
            }
            _ => Err(QuorumError::Unsatisfiable { tally }),
        }
    }

    // A report is a single `Tally::record` call, which cannot panic halfway,
    // so a poisoned tally is still consistent.
    fn lock(&self) -> MutexGuard<'_, Tally> {
        self.tally.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A satisfied wait. Holds the waiter's lock until dropped.
#[derive(Debug)]
pub struct QuorumGuard<'a> {
    guard: MutexGuard<'a, Tally>,
}

impl QuorumGuard<'_> {
    /// The tally that satisfied the predicate.
    pub fn tally(&self) -> Tally {
        *self.guard
    }

    /// Releases the lock and returns the tally seen under it.
    pub fn release(self) -> Tally {
        *self.guard
    }
}

impl Deref for QuorumGuard<'_> {
    type Target = Tally;

    fn deref(&self) -> &Tally {
        &self.guard
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::predicate::{all_reported, at_least, decided};

    #[test]
    fn zero_voters_rejected() {
        assert_eq!(
            QuorumWaiter::new(0).unwrap_err(),
            QuorumError::InvalidVoterCount(0)
        );
    }

    #[test]
    fn report_updates_tally() {
        let waiter = QuorumWaiter::new(3).unwrap();
        assert_eq!(waiter.report(true).unwrap(), Tally { positive: 1, total: 1 });
        assert_eq!(waiter.report(false).unwrap(), Tally { positive: 1, total: 2 });
        assert!(!waiter.is_complete());
        waiter.report(true).unwrap();

        assert!(waiter.is_complete());
        assert_eq!(waiter.tally(), Tally { positive: 2, total: 3 });
    }

    #[test]
    fn report_beyond_voter_count_rejected() {
        let waiter = QuorumWaiter::new(1).unwrap();
        waiter.report(false).unwrap();

        assert_eq!(
            waiter.report(true).unwrap_err(),
            QuorumError::Overreported { voters: 1 }
        );
        assert_eq!(waiter.tally(), Tally { positive: 0, total: 1 });
    }

    #[test]
    fn already_satisfied_returns_immediately() {
        let waiter = QuorumWaiter::new(2).unwrap();
        waiter.report(true).unwrap();

        let guard = waiter.await_until(at_least(1)).unwrap();
        assert_eq!(guard.positive, 1);
    }

    #[test]
    fn unsatisfiable_after_everyone_reported() {
        let waiter = QuorumWaiter::new(2).unwrap();
        waiter.report(false).unwrap();
        waiter.report(false).unwrap();

        let err = waiter.await_until(at_least(1)).unwrap_err();
        assert_eq!(
            err,
            QuorumError::Unsatisfiable {
                tally: Tally { positive: 0, total: 2 }
            }
        );
        assert_eq!(err.tally(), Some(Tally { positive: 0, total: 2 }));
    }

    #[test]
    fn await_timeout_expires() {
        let waiter = QuorumWaiter::new(3).unwrap();
        waiter.report(true).unwrap();

        let err = waiter
            .await_timeout(at_least(2), Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, QuorumError::Timeout { tally, .. } if tally.total == 1));
    }

    #[test]
    fn guard_blocks_reporters_until_released() {
        let waiter = Arc::new(QuorumWaiter::new(2).unwrap());
        waiter.report(true).unwrap();

        let guard = waiter.await_until(at_least(1)).unwrap();

        let reporter = {
            let waiter = Arc::clone(&waiter);
            thread::spawn(move || waiter.report(true).unwrap())
        };

        // The reporter cannot get in while we hold the guard.
        thread::sleep(Duration::from_millis(20));
        assert_eq!(guard.tally(), Tally { positive: 1, total: 1 });
        assert_eq!(guard.release(), Tally { positive: 1, total: 1 });

        assert_eq!(reporter.join().unwrap(), Tally { positive: 2, total: 2 });
    }

    #[test]
    fn coordinator_wakes_on_concurrent_reports() {
        let waiter = Arc::new(QuorumWaiter::new(10).unwrap());

        let voters: Vec<_> = (0..10)
            .map(|i| {
                let waiter = Arc::clone(&waiter);
                thread::spawn(move || waiter.report(i % 2 == 0).unwrap())
            })
            .collect();

        let tally = waiter.await_until(all_reported(10)).unwrap().release();
        assert_eq!(tally, Tally { positive: 5, total: 10 });

        for voter in voters {
            voter.join().unwrap();
        }
    }

    #[test]
    fn decided_returns_once_outcome_is_known() {
        let waiter = QuorumWaiter::new(10).unwrap();
        for _ in 0..5 {
            waiter.report(true).unwrap();
        }

        let guard = waiter.await_until(decided(5, 10)).unwrap();
        assert_eq!(guard.verdict(5), crate::Verdict::Won);
        assert!(guard.total < 10);
    }
}

//! Run a complete vote: spawn voters, wait for the outcome, report it.

use std::thread;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::QuorumResult;
use crate::predicate::decided;
use crate::{QuorumWaiter, Tally, Verdict};

/// What the coordinator saw when the outcome became known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    pub threshold: usize,
    pub voters: usize,
    /// Tally at the moment the outcome was decided. Voters still running
    /// at that point may report afterwards.
    pub tally: Tally,
}

/// Spawns one thread per voter and blocks until the vote is decided.
///
/// Voter `i` casts `ballot(i)`. The vote is decided as soon as `threshold`
/// positive reports land or every voter has reported. All voter threads are
/// joined before returning.
pub fn hold_vote<F>(voters: usize, threshold: usize, ballot: F) -> QuorumResult<Decision>
where
    F: Fn(usize) -> bool + Sync,
{
    let waiter = QuorumWaiter::new(voters)?;

    let tally = thread::scope(|s| {
        let waiter = &waiter;
        let ballot = &ballot;
        let ballots: Vec<_> = (0..voters)
            .map(|voter| s.spawn(move || waiter.report(ballot(voter))))
            .collect();

        let tally = waiter
            .await_until(decided(threshold, voters))
            .map(|guard| guard.release());

        for ballot in ballots {
            ballot
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))?;
        }
        tally
    })?;

    let decision = Decision {
        verdict: tally.verdict(threshold),
        threshold,
        voters,
        tally,
    };
    info!(
        verdict = %decision.verdict,
        %tally,
        threshold,
        "vote decided"
    );
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use test_case::test_case;

    use super::*;
    use crate::QuorumError;

    #[test_case(10, 5, true, Verdict::Won ; "unanimous yes")]
    #[test_case(10, 5, false, Verdict::Lost ; "unanimous no")]
    #[test_case(1, 1, true, Verdict::Won ; "single voter")]
    #[test_case(3, 4, true, Verdict::Lost ; "threshold above voters")]
    fn unanimous_votes(voters: usize, threshold: usize, vote: bool, expected: Verdict) {
        let decision = hold_vote(voters, threshold, |_| vote).unwrap();
        assert_eq!(decision.verdict, expected);
        assert_eq!(decision.voters, voters);
    }

    #[test]
    fn lost_vote_waits_for_everyone() {
        // Only voters 0 and 1 say yes: threshold 3 is never reached.
        let decision = hold_vote(6, 3, |i| i < 2).unwrap();
        assert_eq!(decision.verdict, Verdict::Lost);
        assert_eq!(decision.tally, Tally { positive: 2, total: 6 });
    }

    #[test]
    fn won_vote_has_enough_positive_reports() {
        let decision = hold_vote(20, 5, |i| i % 2 == 0).unwrap();
        assert_eq!(decision.verdict, Verdict::Won);
        assert!(decision.tally.positive >= 5);
    }

    #[test]
    fn every_voter_is_joined_after_early_win() {
        let cast = AtomicUsize::new(0);
        let decision = hold_vote(12, 1, |_| {
            cast.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap();

        assert_eq!(decision.verdict, Verdict::Won);
        assert_eq!(cast.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn zero_voters_rejected() {
        assert_eq!(
            hold_vote(0, 1, |_| true).unwrap_err(),
            QuorumError::InvalidVoterCount(0)
        );
    }
}

//! Vote counts and the verdicts derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Counts of reports received so far.
///
/// Invariant: `positive <= total <= voters` for the waiter it came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tally {
    /// Reports with a `true` outcome.
    pub positive: usize,
    /// All reports, whatever their outcome.
    pub total: usize,
}

impl Tally {
    /// Reports with a `false` outcome.
    ///
    /// Saturates at 0 for a hand-built tally with `positive > total`.
    pub fn negative(&self) -> usize {
        self.total.saturating_sub(self.positive)
    }

    /// `Won` if at least `threshold` reports were positive.
    pub fn verdict(&self, threshold: usize) -> Verdict {
        if self.positive >= threshold {
            Verdict::Won
        } else {
            Verdict::Lost
        }
    }

    pub(crate) fn record(&mut self, outcome: bool) {
        self.total += 1;
        if outcome {
            self.positive += 1;
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.positive, self.total)
    }
}

/// Outcome of a vote against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Won,
    Lost,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Won => "win",
            Verdict::Lost => "lose",
        })
    }
}

//! State commitments and the challenges raised against them.
//!
//! A commitment moves through **Committed → (Challenged) → Finalized**.
//! `finalized` is write-once: once true it never reverts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, ChallengeId, CommitmentId, StateRoot};

/// Lifecycle state of a commitment, derived from the ledger contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommitmentStatus {
    /// Recorded, inside or past its challenge window, no challenge raised.
    Committed,
    /// At least one challenge references it and it is not finalized.
    Challenged,
    /// Irrevocably accepted.
    Finalized,
}

impl fmt::Display for CommitmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Committed => write!(f, "COMMITTED"),
            Self::Challenged => write!(f, "CHALLENGED"),
            Self::Finalized => write!(f, "FINALIZED"),
        }
    }
}

/// A state root recorded by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCommitment {
    pub id: CommitmentId,
    /// The sequencer batch this commitment settles.
    pub batch_index: u64,
    pub state_root: StateRoot,
    pub commit_time: DateTime<Utc>,
    pub proposer: Address,
    pub finalized: bool,
}

impl StateCommitment {
    /// Last instant at which a challenge is still accepted.
    #[must_use]
    pub fn challenge_deadline(&self, challenge_period: std::time::Duration) -> DateTime<Utc> {
        chrono::Duration::from_std(challenge_period)
            .ok()
            .and_then(|period| self.commit_time.checked_add_signed(period))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether `now` is still inside the challenge window (inclusive bound).
    #[must_use]
    pub fn in_challenge_window(&self, now: DateTime<Utc>, challenge_period: std::time::Duration) -> bool {
        now <= self.challenge_deadline(challenge_period)
    }
}

/// Arbitration result of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeOutcome {
    /// The commitment was fraudulent; the sequencer was slashed.
    Fraudulent,
    /// The commitment stood; the challenger's bond was forfeited.
    Rejected,
}

impl fmt::Display for ChallengeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fraudulent => write!(f, "FRAUDULENT"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// A fraud proof raised against a commitment.
///
/// Several challenges may reference the same commitment; none excludes another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub commitment: CommitmentId,
    /// State root the challenger claims the transition started from.
    pub pre_state_root: StateRoot,
    /// State root the challenger claims the transition should reach.
    pub post_state_root: StateRoot,
    /// Opaque transition evidence; not interpreted by the ledger.
    pub evidence: Vec<u8>,
    pub challenger: Address,
    pub challenge_time: DateTime<Utc>,
    /// Bond the challenger locked when raising the challenge.
    pub bond: Amount,
    pub resolved: bool,
    pub outcome: Option<ChallengeOutcome>,
}

impl Challenge {
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.resolved
    }
}

//! Error types for the rollup settlement core.
//!
//! All errors use the `RS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Connection / routing errors
//! - 2xx: Submission errors
//! - 3xx: Ledger errors (commitments, challenges, bonds)
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Address, Amount, ChainId, ChallengeId, CommitmentId};

/// Central error enum for all settlement operations.
#[derive(Debug, Error)]
pub enum RollupError {
    // =================================================================
    // Connection / Routing Errors (1xx)
    // =================================================================
    /// The adapter could not reach its chain. The chain is skipped until it reconnects.
    #[error("RS_ERR_100: Connection to {chain_id} failed: {reason}")]
    ConnectionError { chain_id: ChainId, reason: String },

    /// A cost or metrics query failed. The chain is scored pessimistically.
    #[error("RS_ERR_101: Estimation on {chain_id} failed: {reason}")]
    EstimationError { chain_id: ChainId, reason: String },

    /// No connected adapter could be scored.
    #[error("RS_ERR_102: No available settlement chains")]
    NoAvailableChains,

    /// An adapter for this chain is already registered.
    #[error("RS_ERR_103: Adapter already registered for {0}")]
    DuplicateAdapter(ChainId),

    /// No adapter is registered for this chain.
    #[error("RS_ERR_104: Unknown chain {0}")]
    UnknownChain(ChainId),

    /// The adapter exists but is not connected.
    #[error("RS_ERR_105: {0} is not connected")]
    NotConnected(ChainId),

    // =================================================================
    // Submission Errors (2xx)
    // =================================================================
    /// A settlement transaction failed on-chain.
    #[error("RS_ERR_200: Submission to {chain_id} failed: {reason}")]
    SubmissionError { chain_id: ChainId, reason: String },

    /// Every retry on the selected chain failed.
    #[error("RS_ERR_201: Settlement on {chain_id} failed after {attempts} attempts: {last_error}")]
    SettlementFailed {
        chain_id: ChainId,
        attempts: u32,
        #[source]
        last_error: Box<RollupError>,
    },

    /// Failover tried every ranked chain and none accepted the batch.
    #[error("RS_ERR_202: All {} ranked chains failed; last error: {last_error}", .attempted.len())]
    AllChainsFailed {
        attempted: Vec<ChainId>,
        #[source]
        last_error: Box<RollupError>,
    },

    /// The batch index was already accepted for this sequencer.
    #[error("RS_ERR_203: Batch {batch_index} already submitted by {sequencer} (last accepted {last_accepted})")]
    DuplicateBatch {
        sequencer: Address,
        batch_index: u64,
        last_accepted: u64,
    },

    // =================================================================
    // Ledger Errors (3xx)
    // =================================================================
    /// The challenge targets an unknown, finalized, or out-of-window commitment.
    #[error("RS_ERR_300: Invalid challenge: {reason}")]
    InvalidChallenge { reason: String },

    /// Commit or challenge attempted with less than the required bond.
    #[error("RS_ERR_301: Insufficient bond: need {needed}, have {available}")]
    InsufficientBond { needed: Amount, available: Amount },

    /// Caller lacks the role required for this operation.
    #[error("RS_ERR_302: Unauthorized {caller}: {reason}")]
    Unauthorized { caller: Address, reason: String },

    #[error("RS_ERR_303: Commitment not found: {0}")]
    CommitmentNotFound(CommitmentId),

    #[error("RS_ERR_304: Challenge not found: {0}")]
    ChallengeNotFound(ChallengeId),

    #[error("RS_ERR_305: Challenge already resolved: {0}")]
    ChallengeAlreadyResolved(ChallengeId),

    #[error("RS_ERR_306: Commitment already finalized: {0}")]
    AlreadyFinalized(CommitmentId),

    /// Finalization attempted while the challenge window is still open.
    #[error("RS_ERR_307: Challenge period still active for {0}")]
    ChallengePeriodActive(CommitmentId),

    /// The sequencer tried to withdraw the bond backing unfinalized commitments.
    #[error("RS_ERR_308: Bond locked: {reason}")]
    BondLocked { reason: String },

    /// Withdrawal larger than the available bond.
    #[error("RS_ERR_309: Insufficient available bond: need {needed}, have {available}")]
    InsufficientAvailableBond { needed: Amount, available: Amount },

    /// Bond conservation invariant violated. Critical safety alert.
    #[error("RS_ERR_310: Bond invariant violation: {reason}")]
    BondInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// The adapter does not implement this operation.
    #[error("RS_ERR_900: Unsupported operation: {0}")]
    Unsupported(String),

    #[error("RS_ERR_901: Internal error: {0}")]
    Internal(String),

    #[error("RS_ERR_902: Serialization error: {0}")]
    Serialization(String),

    #[error("RS_ERR_903: Configuration error: {0}")]
    Configuration(String),
}

impl RollupError {
    /// Whether the error is local to one chain and worth retrying there.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError { .. } | Self::EstimationError { .. } | Self::SubmissionError { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, RollupError>;

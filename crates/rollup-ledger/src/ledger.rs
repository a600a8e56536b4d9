//! Per-chain rollup ledger.
//!
//! Each commitment moves through **Committed → (Challenged) → Finalized**:
//! 1. The sequencer commits a state root while holding at least `bond_amount`
//! 2. Anyone bonded may challenge it until `commit_time + challenge_period`
//! 3. The arbiter resolves each challenge: slash the sequencer, or forfeit
//!    the challenger's bond to the sequencer
//! 4. After the window closes, the commitment can be finalized, exactly once
//!
//! Ledgers of different chains share nothing. Callers serialize mutations on
//! one ledger (the owning adapter holds it behind a mutex).

use std::sync::Arc;

use rollup_types::{
    Address, Amount, BondEntry, Challenge, ChallengeId, ChallengeOutcome, Clock, CommitmentId,
    CommitmentStatus, LedgerConfig, Result, RollupError, StateCommitment, StateRoot,
};

use crate::bonds::BondBook;
use crate::submission_guard::SubmissionGuard;
use crate::withdraw_lock::SequencerWithdrawLock;

/// State commitments, challenges and bonds of one settlement chain.
pub struct RollupLedger {
    config: LedgerConfig,
    clock: Arc<dyn Clock>,
    commitments: Vec<StateCommitment>,
    challenges: Vec<Challenge>,
    bonds: BondBook,
    guard: SubmissionGuard,
    withdraw_lock: SequencerWithdrawLock,
    /// Highest finalized commitment.
    last_finalized: Option<CommitmentId>,
}

impl RollupLedger {
    #[must_use]
    pub fn new(config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        let withdraw_lock = SequencerWithdrawLock::new(config.sequencer, config.bond_amount);
        Self {
            config,
            clock,
            commitments: Vec::new(),
            challenges: Vec::new(),
            bonds: BondBook::new(),
            guard: SubmissionGuard::new(),
            withdraw_lock,
            last_finalized: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Commitments
    // -----------------------------------------------------------------------

    /// Record a new state root for `batch_index`.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the sequencer
    /// - `InsufficientBond` if the sequencer's available bond < `bond_amount`
    /// - `DuplicateBatch` if `batch_index` was already accepted
    pub fn commit_state(
        &mut self,
        caller: Address,
        batch_index: u64,
        state_root: StateRoot,
    ) -> Result<CommitmentId> {
        if caller != self.config.sequencer {
            return Err(RollupError::Unauthorized {
                caller,
                reason: "only the sequencer may commit state".into(),
            });
        }
        let available = self.bonds.balance(&caller).available;
        if available < self.config.bond_amount {
            return Err(RollupError::InsufficientBond {
                needed: self.config.bond_amount,
                available,
            });
        }
        self.guard.accept(caller, batch_index)?;

        let id = CommitmentId(self.commitments.len() as u64);
        let commitment = StateCommitment {
            id,
            batch_index,
            state_root,
            commit_time: self.clock.now(),
            proposer: caller,
            finalized: false,
        };
        self.commitments.push(commitment);
        self.withdraw_lock.record_commit();

        tracing::info!(
            commitment = id.0,
            batch = batch_index,
            root = %state_root,
            "State committed"
        );
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Challenges
    // -----------------------------------------------------------------------

    /// Raise a fraud proof against commitment `id`, locking `bond_amount` of
    /// the caller's available bond.
    ///
    /// Any number of challenges may target the same commitment.
    ///
    /// # Errors
    /// - `InvalidChallenge` if the commitment is unknown, finalized, or its
    ///   challenge window has closed
    /// - `InsufficientBond` if the caller's available bond < `bond_amount`
    pub fn challenge_state(
        &mut self,
        caller: Address,
        id: CommitmentId,
        pre_state_root: StateRoot,
        post_state_root: StateRoot,
        evidence: Vec<u8>,
    ) -> Result<ChallengeId> {
        let now = self.clock.now();
        let commitment = self
            .commitment(id)
            .ok_or_else(|| RollupError::InvalidChallenge {
                reason: format!("{id} does not exist"),
            })?;
        if commitment.finalized {
            return Err(RollupError::InvalidChallenge {
                reason: format!("{id} is already finalized"),
            });
        }
        if !commitment.in_challenge_window(now, self.config.challenge_period) {
            return Err(RollupError::InvalidChallenge {
                reason: format!(
                    "challenge window of {id} closed at {}",
                    commitment.challenge_deadline(self.config.challenge_period)
                ),
            });
        }

        let bond = self.config.bond_amount;
        self.bonds.lock(&caller, bond)?;

        let challenge_id = ChallengeId(self.challenges.len() as u64);
        self.challenges.push(Challenge {
            id: challenge_id,
            commitment: id,
            pre_state_root,
            post_state_root,
            evidence,
            challenger: caller,
            challenge_time: now,
            bond,
            resolved: false,
            outcome: None,
        });

        tracing::info!(
            challenge = challenge_id.0,
            commitment = id.0,
            challenger = %caller,
            "State challenged"
        );
        Ok(challenge_id)
    }

    /// Arbitrate a challenge.
    ///
    /// - `fraudulent == true`: the challenger's bond is released and the
    ///   sequencer's entire bond is moved to the challenger.
    /// - `fraudulent == false`: the challenger's bond is forfeited to the
    ///   sequencer.
    ///
    /// # Errors
    /// - `Unauthorized` if `caller` is not the arbiter
    /// - `ChallengeNotFound` / `ChallengeAlreadyResolved`
    pub fn resolve_challenge(
        &mut self,
        caller: Address,
        challenge_id: ChallengeId,
        fraudulent: bool,
    ) -> Result<ChallengeOutcome> {
        if caller != self.config.arbiter {
            return Err(RollupError::Unauthorized {
                caller,
                reason: "only the arbiter may resolve challenges".into(),
            });
        }
        let challenge = self
            .challenge(challenge_id)
            .ok_or(RollupError::ChallengeNotFound(challenge_id))?;
        if challenge.resolved {
            return Err(RollupError::ChallengeAlreadyResolved(challenge_id));
        }
        let challenger = challenge.challenger;
        let bond = challenge.bond;
        let sequencer = self.config.sequencer;

        let outcome = if fraudulent {
            self.bonds.release(&challenger, bond)?;
            let slashed = self.bonds.slash_all(&sequencer, challenger);
            tracing::warn!(
                challenge = challenge_id.0,
                challenger = %challenger,
                slashed,
                "Fraud proven: sequencer bond slashed"
            );
            ChallengeOutcome::Fraudulent
        } else {
            self.bonds.forfeit_locked(&challenger, sequencer, bond)?;
            tracing::info!(
                challenge = challenge_id.0,
                challenger = %challenger,
                forfeited = bond,
                "Challenge rejected: challenger bond forfeited"
            );
            ChallengeOutcome::Rejected
        };

        let index = usize::try_from(challenge_id.0)
            .map_err(|_| RollupError::ChallengeNotFound(challenge_id))?;
        let challenge = &mut self.challenges[index];
        challenge.resolved = true;
        challenge.outcome = Some(outcome);
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Finalization
    // -----------------------------------------------------------------------

    /// Irrevocably accept commitment `id` once its challenge window has closed.
    ///
    /// Open challenges do not block finalization.
    ///
    /// # Errors
    /// - `CommitmentNotFound`
    /// - `AlreadyFinalized` (nothing is applied twice)
    /// - `ChallengePeriodActive` while `now <= commit_time + challenge_period`
    pub fn finalize_state(&mut self, id: CommitmentId) -> Result<()> {
        let now = self.clock.now();
        let period = self.config.challenge_period;
        let commitment = self
            .commitment_mut(id)
            .ok_or(RollupError::CommitmentNotFound(id))?;
        if commitment.finalized {
            return Err(RollupError::AlreadyFinalized(id));
        }
        if commitment.in_challenge_window(now, period) {
            return Err(RollupError::ChallengePeriodActive(id));
        }
        commitment.finalized = true;
        let batch = commitment.batch_index;

        self.withdraw_lock.record_finalized();
        if self.last_finalized.is_none_or(|last| id > last) {
            self.last_finalized = Some(id);
        }

        let open = self.open_challenges(id).len();
        if open > 0 {
            tracing::warn!(
                commitment = id.0,
                open_challenges = open,
                "Finalized with unresolved challenges"
            );
        }
        tracing::info!(commitment = id.0, batch, "State finalized");
        Ok(())
    }

    /// Finalize every commitment whose window has closed. Returns the ids
    /// finalized by this call.
    pub fn finalize_states(&mut self) -> Vec<CommitmentId> {
        let now = self.clock.now();
        let period = self.config.challenge_period;
        let eligible: Vec<CommitmentId> = self
            .commitments
            .iter()
            .filter(|c| !c.finalized && !c.in_challenge_window(now, period))
            .map(|c| c.id)
            .collect();

        eligible
            .into_iter()
            .filter(|id| self.finalize_state(*id).is_ok())
            .collect()
    }

    // -----------------------------------------------------------------------
    // Bonds
    // -----------------------------------------------------------------------

    pub fn deposit_bond(&mut self, caller: Address, amount: Amount) {
        self.bonds.deposit(caller, amount);
        tracing::debug!(who = %caller, amount, "Bond deposited");
    }

    /// # Errors
    /// - `BondLocked` if the sequencer would drop below `bond_amount` while
    ///   commitments are unfinalized
    /// - `InsufficientAvailableBond` if available < amount
    pub fn withdraw_bond(&mut self, caller: Address, amount: Amount) -> Result<()> {
        let available = self.bonds.balance(&caller).available;
        self.withdraw_lock.check_withdraw(&caller, available, amount)?;
        self.bonds.withdraw(&caller, amount)?;
        tracing::debug!(who = %caller, amount, "Bond withdrawn");
        Ok(())
    }

    /// Withdraw everything the caller may currently withdraw. Returns the amount.
    pub fn withdraw_all_bonds(&mut self, caller: Address) -> Result<Amount> {
        let available = self.bonds.balance(&caller).available;
        let amount = available.saturating_sub(self.withdraw_lock.locked_floor(&caller));
        if amount > 0 {
            self.withdraw_bond(caller, amount)?;
        }
        Ok(amount)
    }

    #[must_use]
    pub fn bond_balance(&self, who: &Address) -> BondEntry {
        self.bonds.balance(who)
    }

    /// Check that slashing and forfeiture have neither created nor destroyed collateral.
    pub fn verify_bond_conservation(&self) -> Result<()> {
        self.bonds.verify_conservation()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// State root of the latest commitment, finalized or not.
    #[must_use]
    pub fn current_state_root(&self) -> Option<StateRoot> {
        self.commitments.last().map(|c| c.state_root)
    }

    /// State root of the highest finalized commitment.
    #[must_use]
    pub fn finalized_state_root(&self) -> Option<StateRoot> {
        self.last_finalized
            .and_then(|id| self.commitment(id))
            .map(|c| c.state_root)
    }

    /// Id of the latest commitment.
    #[must_use]
    pub fn last_committed_index(&self) -> Option<CommitmentId> {
        self.commitments.last().map(|c| c.id)
    }

    /// Batch index of the latest commitment.
    #[must_use]
    pub fn last_committed_batch(&self) -> Option<u64> {
        self.guard.last_accepted(&self.config.sequencer)
    }

    #[must_use]
    pub fn commitment(&self, id: CommitmentId) -> Option<&StateCommitment> {
        usize::try_from(id.0)
            .ok()
            .and_then(|i| self.commitments.get(i))
    }

    #[must_use]
    pub fn commitment_count(&self) -> usize {
        self.commitments.len()
    }

    #[must_use]
    pub fn challenge(&self, id: ChallengeId) -> Option<&Challenge> {
        usize::try_from(id.0).ok().and_then(|i| self.challenges.get(i))
    }

    #[must_use]
    pub fn challenge_count(&self) -> usize {
        self.challenges.len()
    }

    /// All challenges against `id`, resolved or not.
    #[must_use]
    pub fn challenges_for(&self, id: CommitmentId) -> Vec<&Challenge> {
        self.challenges
            .iter()
            .filter(|c| c.commitment == id)
            .collect()
    }

    /// Unresolved challenges against `id`.
    #[must_use]
    pub fn open_challenges(&self, id: CommitmentId) -> Vec<&Challenge> {
        self.challenges
            .iter()
            .filter(|c| c.commitment == id && c.is_open())
            .collect()
    }

    /// Lifecycle state of commitment `id`.
    #[must_use]
    pub fn status(&self, id: CommitmentId) -> Option<CommitmentStatus> {
        let commitment = self.commitment(id)?;
        Some(if commitment.finalized {
            CommitmentStatus::Finalized
        } else if self.challenges.iter().any(|c| c.commitment == id) {
            CommitmentStatus::Challenged
        } else {
            CommitmentStatus::Committed
        })
    }

    /// Commitments not yet finalized.
    #[must_use]
    pub fn pending_commitments(&self) -> usize {
        self.withdraw_lock.pending_commitments()
    }

    fn commitment_mut(&mut self, id: CommitmentId) -> Option<&mut StateCommitment> {
        usize::try_from(id.0)
            .ok()
            .and_then(|i| self.commitments.get_mut(i))
    }
}

//! Ledger lifecycle integration tests.
//!
//! Every test drives a `RollupLedger` through commit, challenge, resolution
//! and finalization with a `ManualClock`, then checks bond balances and the
//! conservation invariant.

use std::sync::Arc;
use std::time::Duration;

use rollup_ledger::RollupLedger;
use rollup_types::*;

const BOND: Amount = 1_000_000;
const PERIOD: Duration = Duration::from_secs(7 * 24 * 60 * 60);

struct Fixture {
    ledger: RollupLedger,
    clock: Arc<ManualClock>,
}

fn sequencer() -> Address {
    Address::repeat_byte(0x11)
}

fn arbiter() -> Address {
    Address::repeat_byte(0x22)
}

fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

fn root(byte: u8) -> StateRoot {
    StateRoot([byte; 32])
}

impl Fixture {
    /// Sequencer holds `seq_bond`; alice and bob each hold exactly one bond.
    fn new(seq_bond: Amount) -> Self {
        let clock = Arc::new(ManualClock::starting_now());
        let config = LedgerConfig::new(sequencer(), arbiter())
            .with_bond_amount(BOND)
            .with_challenge_period(PERIOD);
        let mut ledger = RollupLedger::new(config, clock.clone());
        ledger.deposit_bond(sequencer(), seq_bond);
        ledger.deposit_bond(alice(), BOND);
        ledger.deposit_bond(bob(), BOND);
        Self { ledger, clock }
    }

    fn commit(&mut self, batch_index: u64) -> CommitmentId {
        self.ledger
            .commit_state(sequencer(), batch_index, root(batch_index as u8))
            .unwrap()
    }

    fn challenge(&mut self, who: Address, id: CommitmentId) -> Result<ChallengeId> {
        self.ledger
            .challenge_state(who, id, root(0), root(0xff), b"bad transition".to_vec())
    }

    fn assert_conserved(&self) {
        self.ledger.verify_bond_conservation().unwrap();
    }
}

// ---------------------------------------------------------------------------
// Challenge rejection
// ---------------------------------------------------------------------------

#[test]
fn challenge_rejected_without_bond() {
    let mut f = Fixture::new(BOND);
    let id = f.commit(1);
    let poor = Address::repeat_byte(0x99);
    f.ledger.deposit_bond(poor, BOND - 1);

    let err = f.challenge(poor, id).unwrap_err();
    assert!(matches!(err, RollupError::InsufficientBond { .. }));
    assert_eq!(f.ledger.challenge_count(), 0);
    assert_eq!(f.ledger.bond_balance(&poor).available, BOND - 1);
}

#[test]
fn challenge_rejected_after_window() {
    let mut f = Fixture::new(BOND);
    let id = f.commit(1);
    f.clock.advance(PERIOD + Duration::from_millis(1));

    let err = f.challenge(alice(), id).unwrap_err();
    assert!(matches!(err, RollupError::InvalidChallenge { .. }));
    assert_eq!(f.ledger.challenge_count(), 0);
    assert_eq!(f.ledger.bond_balance(&alice()).locked, 0);
}

#[test]
fn challenge_accepted_at_window_edge() {
    let mut f = Fixture::new(BOND);
    let id = f.commit(1);
    f.clock.advance(PERIOD);
    assert!(f.challenge(alice(), id).is_ok());
}

#[test]
fn challenge_rejected_on_finalized_commitment() {
    let mut f = Fixture::new(BOND);
    let id = f.commit(1);
    f.clock.advance(PERIOD + Duration::from_secs(1));
    f.ledger.finalize_state(id).unwrap();

    let err = f.challenge(alice(), id).unwrap_err();
    assert!(matches!(err, RollupError::InvalidChallenge { .. }));
    assert_eq!(f.ledger.challenge_count(), 0);
}

// ---------------------------------------------------------------------------
// Finalization
// ---------------------------------------------------------------------------

#[test]
fn finalize_blocked_during_window_then_once_after() {
    let mut f = Fixture::new(BOND);
    let id = f.commit(1);

    let err = f.ledger.finalize_state(id).unwrap_err();
    assert!(matches!(err, RollupError::ChallengePeriodActive(_)));

    f.clock.advance(PERIOD);
    assert!(
        f.ledger.finalize_state(id).is_err(),
        "deadline instant is still inside the window"
    );

    f.clock.advance(Duration::from_millis(1));
    f.ledger.finalize_state(id).unwrap();
    assert_eq!(f.ledger.status(id), Some(CommitmentStatus::Finalized));
    assert_eq!(f.ledger.pending_commitments(), 0);

    let before = f.ledger.bond_balance(&sequencer());
    let err = f.ledger.finalize_state(id).unwrap_err();
    assert!(matches!(err, RollupError::AlreadyFinalized(_)));
    assert_eq!(f.ledger.pending_commitments(), 0);
    assert_eq!(f.ledger.bond_balance(&sequencer()), before);
    assert_eq!(f.ledger.finalized_state_root(), Some(root(1)));
}

#[test]
fn finalize_unknown_commitment() {
    let mut f = Fixture::new(BOND);
    let err = f.ledger.finalize_state(CommitmentId(42)).unwrap_err();
    assert!(matches!(err, RollupError::CommitmentNotFound(CommitmentId(42))));
}

#[test]
fn open_challenge_does_not_block_finalization() {
    let mut f = Fixture::new(BOND);
    let id = f.commit(1);
    f.challenge(alice(), id).unwrap();
    f.clock.advance(PERIOD + Duration::from_secs(1));

    f.ledger.finalize_state(id).unwrap();
    assert_eq!(f.ledger.open_challenges(id).len(), 1);
}

// ---------------------------------------------------------------------------
// Resolution and bonds
// ---------------------------------------------------------------------------

#[test]
fn fraudulent_resolution_moves_full_sequencer_bond() {
    let seq_bond = 3 * BOND + 7;
    let mut f = Fixture::new(seq_bond);
    let id = f.commit(1);
    let cid = f.challenge(alice(), id).unwrap();

    let outcome = f.ledger.resolve_challenge(arbiter(), cid, true).unwrap();
    assert_eq!(outcome, ChallengeOutcome::Fraudulent);

    assert!(f.ledger.bond_balance(&sequencer()).is_zero());
    assert_eq!(
        f.ledger.bond_balance(&alice()),
        BondEntry {
            available: BOND + seq_bond,
            locked: 0
        }
    );
    let challenge = f.ledger.challenge(cid).unwrap();
    assert!(challenge.resolved);
    assert_eq!(challenge.outcome, Some(ChallengeOutcome::Fraudulent));
    f.assert_conserved();
}

#[test]
fn rejected_resolution_forfeits_challenger_bond() {
    let mut f = Fixture::new(BOND);
    let id = f.commit(1);
    let cid = f.challenge(alice(), id).unwrap();

    let outcome = f.ledger.resolve_challenge(arbiter(), cid, false).unwrap();
    assert_eq!(outcome, ChallengeOutcome::Rejected);

    assert_eq!(f.ledger.bond_balance(&sequencer()).available, 2 * BOND);
    assert!(f.ledger.bond_balance(&alice()).is_zero());
    assert!(f.ledger.open_challenges(id).is_empty());
    f.assert_conserved();
}

#[test]
fn concurrent_challenges_resolved_in_arbitration_order() {
    let mut f = Fixture::new(BOND);
    let id = f.commit(1);
    let first = f.challenge(alice(), id).unwrap();
    let second = f.challenge(bob(), id).unwrap();
    assert_eq!(f.ledger.challenges_for(id).len(), 2);
    assert_eq!(f.ledger.status(id), Some(CommitmentStatus::Challenged));

    f.ledger.resolve_challenge(arbiter(), first, true).unwrap();
    f.ledger.resolve_challenge(arbiter(), second, true).unwrap();

    // The first winner takes the sequencer's bond; the second only recovers its own.
    assert_eq!(f.ledger.bond_balance(&alice()).available, 2 * BOND);
    assert_eq!(f.ledger.bond_balance(&bob()).available, BOND);
    assert!(f.ledger.bond_balance(&sequencer()).is_zero());
    f.assert_conserved();
}

#[test]
fn slashed_sequencer_cannot_commit() {
    let mut f = Fixture::new(BOND);
    let id = f.commit(1);
    let cid = f.challenge(alice(), id).unwrap();
    f.ledger.resolve_challenge(arbiter(), cid, true).unwrap();

    let err = f
        .ledger
        .commit_state(sequencer(), 2, root(2))
        .unwrap_err();
    assert!(matches!(err, RollupError::InsufficientBond { available: 0, .. }));
    assert_eq!(f.ledger.commitment_count(), 1);
}

#[test]
fn challenger_withdraws_after_winning() {
    let mut f = Fixture::new(BOND);
    let id = f.commit(1);
    let cid = f.challenge(alice(), id).unwrap();

    let err = f.ledger.withdraw_bond(alice(), 1).unwrap_err();
    assert!(matches!(err, RollupError::InsufficientAvailableBond { .. }));

    f.ledger.resolve_challenge(arbiter(), cid, true).unwrap();
    let withdrawn = f.ledger.withdraw_all_bonds(alice()).unwrap();
    assert_eq!(withdrawn, 2 * BOND);
    f.assert_conserved();
}

// ---------------------------------------------------------------------------
// Full history
// ---------------------------------------------------------------------------

#[test]
fn many_batches_then_finalize_all() {
    let mut f = Fixture::new(BOND);
    for batch in 1..=10u64 {
        f.commit(batch);
        f.clock.advance(Duration::from_secs(60));
    }
    assert_eq!(f.ledger.commitment_count(), 10);
    assert_eq!(f.ledger.current_state_root(), Some(root(10)));
    assert_eq!(f.ledger.last_committed_index(), Some(CommitmentId(9)));
    assert_eq!(f.ledger.finalized_state_root(), None);

    f.clock.advance(PERIOD);
    let finalized = f.ledger.finalize_states();
    assert_eq!(finalized.len(), 10);
    assert_eq!(f.ledger.finalized_state_root(), Some(root(10)));
    assert!(
        (0..10).all(|i| f.ledger.status(CommitmentId(i)) == Some(CommitmentStatus::Finalized))
    );
    f.assert_conserved();
}

#[test]
fn commitment_serializes_for_audit() {
    let mut f = Fixture::new(BOND);
    let id = f.commit(3);
    let commitment = f.ledger.commitment(id).unwrap();
    let json = serde_json::to_string(commitment).unwrap();
    let back: StateCommitment = serde_json::from_str(&json).unwrap();
    assert_eq!(&back, commitment);
}

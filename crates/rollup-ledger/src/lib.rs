//! # rollup-ledger
//!
//! **Dispute plane**: per-chain state commitments, the challenge window,
//! bond accounting, and slashing.
//!
//! ## Lifecycle
//!
//! A [`RollupLedger`] owns one chain's history:
//! 1. The sequencer commits a state root (bond-gated, one commitment per batch index)
//! 2. Bonded challengers raise fraud proofs inside the challenge window
//! 3. The arbiter resolves each challenge (slash the sequencer, or forfeit the challenger bond)
//! 4. Once the window closes, the commitment is finalized exactly once
//!
//! ## Safety checks
//!
//! - [`SubmissionGuard`]: rejects replayed or out-of-order batch indices
//! - [`SequencerWithdrawLock`]: pins the sequencer bond while commitments are pending
//! - [`BondConservation`]: slashing and forfeiture never create or destroy collateral

pub mod bond_conservation;
pub mod bonds;
pub mod ledger;
pub mod submission_guard;
pub mod withdraw_lock;

pub use bond_conservation::BondConservation;
pub use bonds::BondBook;
pub use ledger::RollupLedger;
pub use submission_guard::SubmissionGuard;
pub use withdraw_lock::SequencerWithdrawLock;

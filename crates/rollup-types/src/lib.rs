//! # rollup-types
//!
//! Shared types, errors, and configuration for the rollup settlement core.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`ChainId`], [`Address`], [`StateRoot`], [`TxHash`], [`CommitmentId`], [`ChallengeId`]
//! - **Batch model**: [`BatchSubmission`]
//! - **Chain model**: [`ChainDescriptor`], [`ChainMetrics`]
//! - **Settlement model**: [`SettlementDecision`], [`SettlementResult`]
//! - **Ledger model**: [`StateCommitment`], [`Challenge`], [`ChallengeOutcome`], [`BondEntry`]
//! - **Configuration**: [`LedgerConfig`], [`RouterConfig`], [`ScoringConfig`], [`RetryPolicy`]
//! - **Time**: [`Clock`], [`SystemClock`], [`ManualClock`]
//! - **Errors**: [`RollupError`] with `RS_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod batch;
pub mod bond;
pub mod chain;
pub mod clock;
pub mod commitment;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod settlement;

pub use batch::*;
pub use bond::*;
pub use chain::*;
pub use clock::*;
pub use commitment::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use settlement::*;

// Constants are accessed via `rollup_types::constants::FOO`
// (not re-exported to avoid name collisions).

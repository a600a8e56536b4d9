//! Routing decisions and settlement outcomes.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Amount, ChainId, TxHash};

/// One ranked candidate produced by batch analysis. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementDecision {
    pub chain_id: ChainId,
    /// Estimated cost of settling the batch on this chain.
    pub estimated_cost: Amount,
    /// Estimated time until the settlement is final.
    pub estimated_time: Duration,
    /// Weighted score in `[0, 100]`; higher is better.
    pub score: Decimal,
    /// Human-readable explanation (e.g., "low cost, fast finality").
    pub reason: String,
}

/// Outcome of submitting one batch to one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub success: bool,
    /// The chain that accepted (or rejected) the batch.
    pub chain_id: ChainId,
    /// Chain-side settlement transaction reference.
    pub tx_ref: TxHash,
    /// Resource cost actually paid.
    pub gas_cost: Amount,
    /// Wall-clock time until the settlement is final.
    pub finalization_time: Duration,
}

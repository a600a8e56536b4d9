//! Settlement statistics and reporting.
//!
//! The router keeps one [`StatsTracker`] behind a write lock; every
//! successful submission updates batch count, cumulative cost and
//! cumulative finalization time in a single locked step, so readers never
//! see a half-applied update. Averages are derived from the totals, so the
//! stats can be rebuilt by replaying the submission history.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rollup_types::{Amount, ChainId, Result, RollupError, SettlementResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::strategy::RoutingStrategy;

/// Usage of one settlement chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStats {
    /// Successful submissions.
    pub batch_count: u64,
    /// Sum of the gas cost of every successful submission.
    pub total_cost: Amount,
    /// Sum of reported finalization times, in milliseconds.
    pub total_finalization_ms: u128,
    /// `total_finalization_ms / batch_count`, truncated to the millisecond.
    pub average_finalization: Duration,
    /// Attempts that returned an error or an unsuccessful result.
    pub failed_submissions: u64,
}

impl ChainStats {
    fn record_success(&mut self, cost: Amount, finalization: Duration) {
        self.batch_count += 1;
        self.total_cost = self.total_cost.saturating_add(cost);
        self.total_finalization_ms = self
            .total_finalization_ms
            .saturating_add(finalization.as_millis());
        let average_ms = self.total_finalization_ms / u128::from(self.batch_count);
        self.average_finalization =
            Duration::from_millis(u64::try_from(average_ms).unwrap_or(u64::MAX));
    }

    fn record_failure(&mut self) {
        self.failed_submissions += 1;
    }
}

/// Aggregate view across every chain the router has used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementStats {
    pub total_batches: u64,
    pub total_cost: Amount,
    /// `total_cost / total_batches`, integer division; zero before the first batch.
    pub average_cost: Amount,
    pub failed_submissions: u64,
    pub chains: BTreeMap<ChainId, ChainStats>,
}

/// Serialisable snapshot for operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReport {
    pub generated_at: DateTime<Utc>,
    pub strategy: RoutingStrategy,
    pub registered_chains: Vec<ChainId>,
    pub connected_chains: Vec<ChainId>,
    pub stats: SettlementStats,
    /// Share of successful batches per chain, in percent (two decimals).
    pub usage_percentage: BTreeMap<ChainId, Decimal>,
}

impl SettlementReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| RollupError::Serialization(e.to_string()))
    }
}

/// Mutable statistics owned by the router.
#[derive(Debug, Default)]
pub struct StatsTracker {
    chains: BTreeMap<ChainId, ChainStats>,
}

impl StatsTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `result` to `chain_id`, the chain the batch was sent to.
    pub fn record_success(&mut self, chain_id: ChainId, result: &SettlementResult) {
        self.chains
            .entry(chain_id)
            .or_default()
            .record_success(result.gas_cost, result.finalization_time);
    }

    pub fn record_failure(&mut self, chain_id: ChainId) {
        self.chains.entry(chain_id).or_default().record_failure();
    }

    #[must_use]
    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainStats> {
        self.chains.get(&chain_id)
    }

    #[must_use]
    pub fn snapshot(&self) -> SettlementStats {
        let total_batches: u64 = self.chains.values().map(|c| c.batch_count).sum();
        let total_cost: Amount = self
            .chains
            .values()
            .fold(0, |acc: Amount, c| acc.saturating_add(c.total_cost));
        let average_cost = if total_batches == 0 {
            0
        } else {
            total_cost / Amount::from(total_batches)
        };
        SettlementStats {
            total_batches,
            total_cost,
            average_cost,
            failed_submissions: self.chains.values().map(|c| c.failed_submissions).sum(),
            chains: self.chains.clone(),
        }
    }

    /// Percentage of successful batches settled on each chain. Empty before
    /// the first success.
    #[must_use]
    pub fn usage_percentage(&self) -> BTreeMap<ChainId, Decimal> {
        let total: u64 = self.chains.values().map(|c| c.batch_count).sum();
        if total == 0 {
            return BTreeMap::new();
        }
        let total = Decimal::from(total);
        self.chains
            .iter()
            .map(|(id, c)| {
                let share = Decimal::from(c.batch_count) * Decimal::ONE_HUNDRED / total;
                (*id, share.round_dp(2))
            })
            .collect()
    }
}

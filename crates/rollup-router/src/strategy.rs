//! Routing strategies used by `submit_batch` to pick one chain.
//!
//! Selection is split in two: [`RoutingStrategy::select_chain`] gathers
//! quotes from the connected adapters, then the pure
//! [`RoutingStrategy::select_from_quotes`] decides. Tests drive the pure half
//! directly with hand-built quotes.

use std::fmt;

use rollup_types::{BatchSubmission, Result, RollupError, ScoringConfig, SettlementDecision};
use serde::{Deserialize, Serialize};

use crate::adapter::{ChainAdapter, ChainQuote, collect_quotes};
use crate::scoring::{max_cost, max_finalization_ms, normalized_inverse, rank_quotes};

/// How `submit_batch` picks a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoutingStrategy {
    /// Strictly lowest estimated cost.
    CostOptimized,
    /// Strictly shortest finalization time.
    SpeedOptimized,
    /// Highest weighted score under `ScoringConfig::balanced_strategy` (0.4/0.4/0.2).
    #[default]
    Balanced,
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CostOptimized => write!(f, "cost-optimized"),
            Self::SpeedOptimized => write!(f, "speed-optimized"),
            Self::Balanced => write!(f, "balanced"),
        }
    }
}

impl RoutingStrategy {
    /// Quote every connected adapter and select one.
    ///
    /// # Errors
    /// `NoAvailableChains` if no adapter is connected or every quote the
    /// strategy depends on is degraded.
    pub async fn select_chain(
        self,
        batch: &BatchSubmission,
        adapters: &[Box<dyn ChainAdapter>],
        scoring: &ScoringConfig,
    ) -> Result<SettlementDecision> {
        let quotes = collect_quotes(adapters, batch).await;
        let decision = self.select_from_quotes(&quotes, scoring)?;
        tracing::debug!(
            strategy = %self,
            chain = %decision.chain_id,
            score = %decision.score,
            "Strategy selected chain"
        );
        Ok(decision)
    }

    /// Pick a chain from quotes listed in registration order.
    ///
    /// Degraded quotes compete with their pessimistic values substituted, so
    /// a chain with one failed query can still win on its other dimensions.
    /// Ties go to the earliest registered chain.
    ///
    /// # Errors
    /// `NoAvailableChains` if there are no quotes, or every quote is degraded
    /// in what the strategy looks at: cost for `CostOptimized`, metrics for
    /// `SpeedOptimized`, either for `Balanced`.
    pub fn select_from_quotes(
        self,
        quotes: &[ChainQuote],
        scoring: &ScoringConfig,
    ) -> Result<SettlementDecision> {
        match self {
            Self::CostOptimized => {
                if quotes.iter().all(|q| q.cost_degraded) {
                    return Err(RollupError::NoAvailableChains);
                }
                let best = quotes
                    .iter()
                    .min_by_key(|q| q.cost)
                    .ok_or(RollupError::NoAvailableChains)?;
                Ok(single_dimension(
                    best,
                    normalized_inverse(best.cost, max_cost(quotes)),
                    "lowest cost",
                ))
            }
            Self::SpeedOptimized => {
                if quotes.iter().all(|q| q.metrics_degraded) {
                    return Err(RollupError::NoAvailableChains);
                }
                let best = quotes
                    .iter()
                    .min_by_key(|q| q.metrics.finalization_time)
                    .ok_or(RollupError::NoAvailableChains)?;
                Ok(single_dimension(
                    best,
                    normalized_inverse(
                        best.metrics.finalization_time.as_millis(),
                        max_finalization_ms(quotes),
                    ),
                    "fastest finality",
                ))
            }
            Self::Balanced => {
                if quotes.iter().all(ChainQuote::is_degraded) {
                    return Err(RollupError::NoAvailableChains);
                }
                rank_quotes(quotes, &scoring.balanced_strategy, scoring.reason_threshold)
                    .into_iter()
                    .next()
                    .ok_or(RollupError::NoAvailableChains)
            }
        }
    }
}

fn single_dimension(
    quote: &ChainQuote,
    score: rust_decimal::Decimal,
    reason: &str,
) -> SettlementDecision {
    SettlementDecision {
        chain_id: quote.chain_id,
        estimated_cost: quote.cost,
        estimated_time: quote.metrics.finalization_time,
        score,
        reason: reason.to_string(),
    }
}

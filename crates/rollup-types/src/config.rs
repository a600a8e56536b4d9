//! Configuration for ledgers and the settlement router.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, Amount, Result, RollupError, constants};

/// Parameters of one chain's rollup ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// The only address allowed to commit state.
    pub sequencer: Address,
    /// The only address allowed to resolve challenges.
    pub arbiter: Address,
    /// Bond required to commit (sequencer) and to challenge (challenger).
    pub bond_amount: Amount,
    /// Window after a commitment during which it can be challenged.
    pub challenge_period: Duration,
}

impl LedgerConfig {
    /// Ledger config with the default bond and challenge period.
    #[must_use]
    pub fn new(sequencer: Address, arbiter: Address) -> Self {
        Self {
            sequencer,
            arbiter,
            bond_amount: constants::DEFAULT_BOND_AMOUNT,
            challenge_period: Duration::from_secs(constants::DEFAULT_CHALLENGE_PERIOD_SECS),
        }
    }

    #[must_use]
    pub fn with_bond_amount(mut self, bond_amount: Amount) -> Self {
        self.bond_amount = bond_amount;
        self
    }

    #[must_use]
    pub fn with_challenge_period(mut self, challenge_period: Duration) -> Self {
        self.challenge_period = challenge_period;
        self
    }
}

/// Weights of the cost / time / load sub-scores. Each weight is a fraction;
/// a well-formed set sums to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub cost: Decimal,
    pub time: Decimal,
    pub load: Decimal,
}

impl ScoringWeights {
    /// 0.5 cost / 0.3 time / 0.2 load: the router's batch analysis ranking.
    #[must_use]
    pub fn router_analysis() -> Self {
        Self {
            cost: Decimal::new(5, 1),
            time: Decimal::new(3, 1),
            load: Decimal::new(2, 1),
        }
    }

    /// 0.4 cost / 0.4 time / 0.2 load: the `Balanced` routing strategy.
    #[must_use]
    pub fn balanced_strategy() -> Self {
        Self {
            cost: Decimal::new(4, 1),
            time: Decimal::new(4, 1),
            load: Decimal::new(2, 1),
        }
    }

    /// Weighted sum of three sub-scores.
    #[must_use]
    pub fn combine(&self, cost_score: Decimal, time_score: Decimal, load_score: Decimal) -> Decimal {
        self.cost * cost_score + self.time * time_score + self.load * load_score
    }

    #[must_use]
    pub fn is_normalized(&self) -> bool {
        self.cost >= Decimal::ZERO
            && self.time >= Decimal::ZERO
            && self.load >= Decimal::ZERO
            && self.cost + self.time + self.load == Decimal::ONE
    }
}

/// Both weighting schemes in one place.
///
/// Batch analysis (`analyze_batch` and failover ranking) uses
/// `router_analysis`; the `Balanced` strategy behind `submit_batch` uses
/// `balanced_strategy`. They are intentionally kept apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub router_analysis: ScoringWeights,
    pub balanced_strategy: ScoringWeights,
    /// A sub-score strictly above this value is named in the decision reason.
    pub reason_threshold: Decimal,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            router_analysis: ScoringWeights::router_analysis(),
            balanced_strategy: ScoringWeights::balanced_strategy(),
            reason_threshold: Decimal::from(constants::DEFAULT_REASON_THRESHOLD),
        }
    }
}

/// Bounded retry with fixed backoff for single-chain submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// No retries, no delay.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: constants::DEFAULT_MAX_RETRIES,
            backoff: Duration::from_millis(constants::DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

/// Settlement router configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    pub scoring: ScoringConfig,
    pub retry: RetryPolicy,
    /// TTL of cached chain metrics. Adapters built by the orchestrator use it.
    pub metrics_ttl: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            retry: RetryPolicy::default(),
            metrics_ttl: Duration::from_secs(constants::DEFAULT_METRICS_TTL_SECS),
        }
    }
}

impl RouterConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RollupError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject weight sets that do not sum to one and thresholds above the score range.
    pub fn validate(&self) -> Result<()> {
        for (name, weights) in [
            ("router_analysis", &self.scoring.router_analysis),
            ("balanced_strategy", &self.scoring.balanced_strategy),
        ] {
            if !weights.is_normalized() {
                return Err(RollupError::Configuration(format!(
                    "{name} weights must be non-negative and sum to 1 (cost={}, time={}, load={})",
                    weights.cost, weights.time, weights.load
                )));
            }
        }
        let threshold = self.scoring.reason_threshold;
        if threshold < Decimal::ZERO || threshold > Decimal::from(constants::MAX_SCORE) {
            return Err(RollupError::Configuration(format!(
                "reason_threshold {threshold} outside [0, {}]",
                constants::MAX_SCORE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_config_defaults() {
        let cfg = LedgerConfig::new(Address::repeat_byte(1), Address::repeat_byte(2));
        assert_eq!(cfg.bond_amount, constants::DEFAULT_BOND_AMOUNT);
        assert_eq!(cfg.challenge_period.as_secs(), 604_800);
    }

    #[test]
    fn ledger_config_builders() {
        let cfg = LedgerConfig::new(Address::repeat_byte(1), Address::repeat_byte(2))
            .with_bond_amount(500)
            .with_challenge_period(Duration::from_secs(60));
        assert_eq!(cfg.bond_amount, 500);
        assert_eq!(cfg.challenge_period, Duration::from_secs(60));
    }

    #[test]
    fn both_weight_sets_are_normalized_and_distinct() {
        let router = ScoringWeights::router_analysis();
        let balanced = ScoringWeights::balanced_strategy();
        assert!(router.is_normalized());
        assert!(balanced.is_normalized());
        assert_ne!(router, balanced);
    }

    #[test]
    fn combine_weights_sub_scores() {
        let w = ScoringWeights::router_analysis();
        // 0.5*80 + 0.3*50 + 0.2*100 = 40 + 15 + 20 = 75
        let score = w.combine(Decimal::from(80), Decimal::from(50), Decimal::from(100));
        assert_eq!(score, Decimal::from(75));
    }

    #[test]
    fn retry_policy_defaults() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_retries, 2);
        assert_eq!(p.total_attempts(), 3);
        assert_eq!(p.backoff.as_millis(), 5000);
        assert_eq!(RetryPolicy::none().total_attempts(), 1);
    }

    #[test]
    fn router_config_defaults_validate() {
        let cfg = RouterConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.metrics_ttl.as_secs(), 30);
        assert_eq!(cfg.scoring.reason_threshold, Decimal::from(70));
    }

    #[test]
    fn router_config_json_roundtrip() {
        let cfg = RouterConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back = RouterConfig::from_json(&json).unwrap();
        assert_eq!(back.retry, cfg.retry);
        assert_eq!(back.scoring.router_analysis, cfg.scoring.router_analysis);
    }

    #[test]
    fn router_config_rejects_bad_weights() {
        let mut cfg = RouterConfig::default();
        cfg.scoring.balanced_strategy.load = Decimal::new(3, 1);
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, RollupError::Configuration(_)));
        assert!(err.to_string().contains("balanced_strategy"));
    }

    #[test]
    fn router_config_rejects_malformed_json() {
        let err = RouterConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, RollupError::Serialization(_)));
    }
}

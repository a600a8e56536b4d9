//! Settlement chain descriptors and live metrics.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Amount, ChainId, constants};

/// Static description of a settlement backend. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub chain_id: ChainId,
    /// Human-readable name (e.g., "ethereum-mainnet").
    pub name: String,
    /// Confirmations required before a settlement tx is considered included.
    pub confirmations: u32,
    /// Gas (resource) limit a single settlement transaction may consume.
    pub gas_limit: u64,
}

impl ChainDescriptor {
    #[must_use]
    pub fn new(chain_id: ChainId, name: impl Into<String>, confirmations: u32, gas_limit: u64) -> Self {
        Self {
            chain_id,
            name: name.into(),
            confirmations,
            gas_limit,
        }
    }
}

/// Snapshot of a chain's current conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainMetrics {
    /// Typical cost of one settlement transaction.
    pub gas_cost: Amount,
    /// Average block interval.
    pub block_time: Duration,
    /// Time until a settlement transaction is final on that chain.
    pub finalization_time: Duration,
    /// Congestion in percent, 0 (idle) to 100 (saturated).
    pub load: u8,
}

impl ChainMetrics {
    /// Metrics reported for a chain that could not be queried.
    ///
    /// Every field is the worst value the scorer can see, so the chain stays
    /// in the ranking but loses on every dimension.
    #[must_use]
    pub fn pessimistic() -> Self {
        Self {
            gas_cost: constants::PESSIMISTIC_GAS_COST,
            block_time: Duration::from_secs(constants::PESSIMISTIC_BLOCK_TIME_SECS),
            finalization_time: Duration::from_secs(constants::PESSIMISTIC_FINALIZATION_SECS),
            load: constants::PESSIMISTIC_LOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_new() {
        let d = ChainDescriptor::new(ChainId(1), "ethereum", 12, 30_000_000);
        assert_eq!(d.chain_id, ChainId(1));
        assert_eq!(d.name, "ethereum");
        assert_eq!(d.confirmations, 12);
    }

    #[test]
    fn pessimistic_metrics_are_saturated() {
        let m = ChainMetrics::pessimistic();
        assert_eq!(m.load, 100);
        assert_eq!(m.gas_cost, constants::PESSIMISTIC_GAS_COST);
        assert_eq!(m.finalization_time.as_secs(), 7 * 24 * 60 * 60);
    }

    #[test]
    fn metrics_serde_roundtrip() {
        let m = ChainMetrics {
            gas_cost: 21_000,
            block_time: Duration::from_secs(12),
            finalization_time: Duration::from_secs(900),
            load: 40,
        };
        let json = serde_json::to_string(&m).unwrap();
        let back: ChainMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}

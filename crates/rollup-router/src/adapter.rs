//! The settlement-chain capability and the quoting helpers built on it.
//!
//! A [`ChainAdapter`] is everything the router knows about one backend. The
//! router never trusts a quote blindly: [`estimate_or_pessimistic`] and
//! [`metrics_or_pessimistic`] turn any failed query into the pessimistic
//! constants so a flaky chain ranks last instead of aborting the analysis.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use rollup_types::{
    Address, Amount, BatchSubmission, ChainDescriptor, ChainId, ChainMetrics, Result, RollupError,
    SettlementResult, TxHash, constants,
};

/// One settlement backend.
///
/// Implementations use interior mutability: the router calls every method
/// through a shared reference, possibly from several futures at once.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Immutable identity and limits of the chain.
    fn descriptor(&self) -> &ChainDescriptor;

    fn chain_id(&self) -> ChainId {
        self.descriptor().chain_id
    }

    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Send one settlement transaction carrying `batch`.
    ///
    /// Not idempotent: every call is a new transaction.
    async fn submit_batch(&self, batch: &BatchSubmission) -> Result<SettlementResult>;

    /// Whether a settlement transaction with this reference was accepted.
    async fn verify_batch_submission(&self, tx_ref: &TxHash) -> Result<bool>;

    /// Cost of settling `batch`, in the smallest unit of the chain's fee asset.
    async fn estimate_gas_cost(&self, batch: &BatchSubmission) -> Result<Amount>;

    async fn get_metrics(&self) -> Result<ChainMetrics>;

    /// Lock funds on the chain's bridge.
    async fn lock_tokens(&self, _owner: Address, _amount: Amount) -> Result<TxHash> {
        Err(RollupError::Unsupported(format!(
            "lock_tokens on {}",
            self.chain_id()
        )))
    }

    /// Release funds from the chain's bridge.
    async fn unlock_tokens(&self, _owner: Address, _amount: Amount) -> Result<TxHash> {
        Err(RollupError::Unsupported(format!(
            "unlock_tokens on {}",
            self.chain_id()
        )))
    }
}

/// Shared adapters: the router owns the `Arc`, the caller keeps a handle for
/// failure injection or ledger access.
#[async_trait]
impl<T: ChainAdapter + ?Sized> ChainAdapter for Arc<T> {
    fn descriptor(&self) -> &ChainDescriptor {
        (**self).descriptor()
    }

    async fn connect(&self) -> Result<()> {
        (**self).connect().await
    }

    async fn disconnect(&self) -> Result<()> {
        (**self).disconnect().await
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    async fn submit_batch(&self, batch: &BatchSubmission) -> Result<SettlementResult> {
        (**self).submit_batch(batch).await
    }

    async fn verify_batch_submission(&self, tx_ref: &TxHash) -> Result<bool> {
        (**self).verify_batch_submission(tx_ref).await
    }

    async fn estimate_gas_cost(&self, batch: &BatchSubmission) -> Result<Amount> {
        (**self).estimate_gas_cost(batch).await
    }

    async fn get_metrics(&self) -> Result<ChainMetrics> {
        (**self).get_metrics().await
    }

    async fn lock_tokens(&self, owner: Address, amount: Amount) -> Result<TxHash> {
        (**self).lock_tokens(owner, amount).await
    }

    async fn unlock_tokens(&self, owner: Address, amount: Amount) -> Result<TxHash> {
        (**self).unlock_tokens(owner, amount).await
    }
}

/// Cost and metrics of one connected chain for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainQuote {
    pub chain_id: ChainId,
    pub cost: Amount,
    pub metrics: ChainMetrics,
    /// The cost estimate failed and `cost` is the pessimistic constant.
    pub cost_degraded: bool,
    /// The metrics query failed and `metrics` are pessimistic.
    pub metrics_degraded: bool,
}

impl ChainQuote {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.cost_degraded || self.metrics_degraded
    }
}

/// Gas estimate, or [`constants::PESSIMISTIC_GAS_COST`] if the query fails.
///
/// The flag is `true` when the pessimistic value was substituted.
pub async fn estimate_or_pessimistic(
    adapter: &dyn ChainAdapter,
    batch: &BatchSubmission,
) -> (Amount, bool) {
    match adapter.estimate_gas_cost(batch).await {
        Ok(cost) => (cost, false),
        Err(e) => {
            let err = RollupError::EstimationError {
                chain_id: adapter.chain_id(),
                reason: e.to_string(),
            };
            tracing::warn!(chain = %adapter.chain_id(), error = %err, "Gas estimate unavailable, scoring pessimistically");
            (constants::PESSIMISTIC_GAS_COST, true)
        }
    }
}

/// Chain metrics, or [`ChainMetrics::pessimistic`] if the query fails.
pub async fn metrics_or_pessimistic(adapter: &dyn ChainAdapter) -> (ChainMetrics, bool) {
    match adapter.get_metrics().await {
        Ok(metrics) => (metrics, false),
        Err(e) => {
            let err = RollupError::EstimationError {
                chain_id: adapter.chain_id(),
                reason: e.to_string(),
            };
            tracing::warn!(chain = %adapter.chain_id(), error = %err, "Metrics unavailable, scoring pessimistically");
            (ChainMetrics::pessimistic(), true)
        }
    }
}

/// Quote one adapter: cost and metrics are fetched concurrently.
pub async fn quote(adapter: &dyn ChainAdapter, batch: &BatchSubmission) -> ChainQuote {
    let ((cost, cost_degraded), (metrics, metrics_degraded)) = futures::join!(
        estimate_or_pessimistic(adapter, batch),
        metrics_or_pessimistic(adapter)
    );
    ChainQuote {
        chain_id: adapter.chain_id(),
        cost,
        metrics,
        cost_degraded,
        metrics_degraded,
    }
}

/// Quote every connected adapter concurrently. Quotes come back in
/// registration order; disconnected adapters are skipped.
pub async fn collect_quotes(
    adapters: &[Box<dyn ChainAdapter>],
    batch: &BatchSubmission,
) -> Vec<ChainQuote> {
    join_all(
        adapters
            .iter()
            .filter(|adapter| adapter.is_connected())
            .map(|adapter| quote(adapter.as_ref(), batch)),
    )
    .await
}

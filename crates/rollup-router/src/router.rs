//! Multi-chain settlement router.
//!
//! The router exclusively owns its adapters, in registration order. A batch
//! reaches a chain in one of two ways:
//! - [`SettlementRouter::submit_batch`]: the routing strategy picks one chain,
//!   which gets `1 + max_retries` attempts with a fixed backoff
//! - [`SettlementRouter::submit_batch_with_failover`]: chains are tried once
//!   each, in [`SettlementRouter::analyze_batch`] ranking order
//!
//! Submissions through one router are sequential. Connecting, disconnecting
//! and quoting fan out to every adapter concurrently.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use rollup_types::{
    BatchSubmission, ChainId, Clock, Result, RollupError, RouterConfig, SettlementDecision,
    SettlementResult, SystemClock,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::adapter::{ChainAdapter, collect_quotes};
use crate::scoring::rank_quotes;
use crate::stats::{SettlementReport, SettlementStats, StatsTracker};
use crate::strategy::RoutingStrategy;

/// Outcome of a best-effort connect or disconnect fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSummary {
    pub succeeded: Vec<ChainId>,
    pub failed: Vec<(ChainId, String)>,
}

impl ConnectionSummary {
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Routes rollup batches to settlement chains.
pub struct SettlementRouter {
    adapters: Vec<Box<dyn ChainAdapter>>,
    strategy: RoutingStrategy,
    config: RouterConfig,
    stats: RwLock<StatsTracker>,
    clock: Arc<dyn Clock>,
}

impl SettlementRouter {
    #[must_use]
    pub fn new(strategy: RoutingStrategy, config: RouterConfig) -> Self {
        Self::with_clock(strategy, config, Arc::new(SystemClock::new()))
    }

    /// Router whose reports are timestamped by `clock`.
    #[must_use]
    pub fn with_clock(strategy: RoutingStrategy, config: RouterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            adapters: Vec::new(),
            strategy,
            config,
            stats: RwLock::new(StatsTracker::new()),
            clock,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> RoutingStrategy {
        self.strategy
    }

    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Take ownership of `adapter`. Each chain can be registered once.
    ///
    /// # Errors
    /// `DuplicateAdapter` if an adapter with the same chain id is registered.
    pub fn register_adapter(&mut self, adapter: Box<dyn ChainAdapter>) -> Result<()> {
        let chain_id = adapter.chain_id();
        if self.adapter(chain_id).is_some() {
            return Err(RollupError::DuplicateAdapter(chain_id));
        }
        tracing::info!(chain = %chain_id, name = %adapter.descriptor().name, "Adapter registered");
        self.adapters.push(adapter);
        Ok(())
    }

    /// Registered chains in registration order.
    #[must_use]
    pub fn chains(&self) -> Vec<ChainId> {
        self.adapters.iter().map(|a| a.chain_id()).collect()
    }

    #[must_use]
    pub fn connected_chains(&self) -> Vec<ChainId> {
        self.adapters
            .iter()
            .filter(|a| a.is_connected())
            .map(|a| a.chain_id())
            .collect()
    }

    fn adapter(&self, chain_id: ChainId) -> Option<&dyn ChainAdapter> {
        self.adapters
            .iter()
            .find(|a| a.chain_id() == chain_id)
            .map(|a| a.as_ref())
    }

    // -----------------------------------------------------------------------
    // Connection
    // -----------------------------------------------------------------------

    /// Connect every adapter concurrently. Failures are logged and reported,
    /// never raised.
    pub async fn connect(&self) -> ConnectionSummary {
        let results = join_all(
            self.adapters
                .iter()
                .map(|a| async move { (a.chain_id(), a.connect().await) }),
        )
        .await;
        summarize("connect", results)
    }

    /// Disconnect every adapter concurrently.
    pub async fn disconnect(&self) -> ConnectionSummary {
        let results = join_all(
            self.adapters
                .iter()
                .map(|a| async move { (a.chain_id(), a.disconnect().await) }),
        )
        .await;
        summarize("disconnect", results)
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    /// One decision per connected chain, best first.
    ///
    /// Scores use `ScoringConfig::router_analysis` weights. Failed queries
    /// are scored pessimistically rather than dropped.
    ///
    /// # Errors
    /// `NoAvailableChains` if no adapter is connected.
    pub async fn analyze_batch(&self, batch: &BatchSubmission) -> Result<Vec<SettlementDecision>> {
        let quotes = collect_quotes(&self.adapters, batch).await;
        if quotes.is_empty() {
            return Err(RollupError::NoAvailableChains);
        }
        let scoring = &self.config.scoring;
        let decisions = rank_quotes(&quotes, &scoring.router_analysis, scoring.reason_threshold);
        tracing::debug!(
            batch = batch.batch_index,
            ranking = ?decisions.iter().map(|d| d.chain_id.0).collect::<Vec<_>>(),
            "Batch analyzed"
        );
        Ok(decisions)
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Settle `batch` on the chain picked by the routing strategy.
    ///
    /// Transient failures are retried on the same chain after the configured
    /// backoff; any other error ends the attempts early.
    ///
    /// # Errors
    /// - `NoAvailableChains` if the strategy finds no candidate
    /// - `SettlementFailed` carrying the last error once attempts are exhausted
    pub async fn submit_batch(&self, batch: &BatchSubmission) -> Result<SettlementResult> {
        let decision = self
            .strategy
            .select_chain(batch, &self.adapters, &self.config.scoring)
            .await?;
        let chain_id = decision.chain_id;
        let retry = self.config.retry;
        let max_attempts = retry.total_attempts();

        let mut attempts = 0;
        let last_error = loop {
            attempts += 1;
            let err = match self.submit_to_chain(chain_id, batch).await {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };
            tracing::warn!(
                chain = %chain_id,
                batch = batch.batch_index,
                attempt = attempts,
                max_attempts,
                error = %err,
                "Settlement attempt failed"
            );
            if attempts >= max_attempts || !err.is_transient() {
                break err;
            }
            tokio::time::sleep(retry.backoff).await;
        };

        Err(RollupError::SettlementFailed {
            chain_id,
            attempts,
            last_error: Box::new(last_error),
        })
    }

    /// Settle `batch` on the best chain that accepts it, trying each
    /// connected chain once in ranking order.
    ///
    /// # Errors
    /// - `NoAvailableChains` if no adapter is connected
    /// - `AllChainsFailed` with every chain tried and the last error
    pub async fn submit_batch_with_failover(
        &self,
        batch: &BatchSubmission,
    ) -> Result<SettlementResult> {
        let ranking = self.analyze_batch(batch).await?;
        let mut attempted = Vec::with_capacity(ranking.len());
        let mut last_error = None;

        for decision in ranking {
            attempted.push(decision.chain_id);
            match self.submit_to_chain(decision.chain_id, batch).await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    tracing::warn!(
                        chain = %decision.chain_id,
                        batch = batch.batch_index,
                        error = %err,
                        "Failing over to next chain"
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(RollupError::AllChainsFailed {
            attempted,
            last_error: Box::new(
                last_error.unwrap_or_else(|| RollupError::Internal("no chain attempted".into())),
            ),
        })
    }

    /// One submission attempt on a specific chain. Statistics are updated
    /// on success and on adapter failure.
    ///
    /// # Errors
    /// - `UnknownChain` / `NotConnected`
    /// - the adapter's error, or `SubmissionError` if it reports `success == false`
    pub async fn submit_to_chain(
        &self,
        chain_id: ChainId,
        batch: &BatchSubmission,
    ) -> Result<SettlementResult> {
        let adapter = self
            .adapter(chain_id)
            .ok_or(RollupError::UnknownChain(chain_id))?;
        if !adapter.is_connected() {
            return Err(RollupError::NotConnected(chain_id));
        }

        let outcome = match adapter.submit_batch(batch).await {
            Ok(result) if result.success => Ok(result),
            Ok(result) => Err(RollupError::SubmissionError {
                chain_id,
                reason: format!("settlement tx {} reported failure", result.tx_ref.short()),
            }),
            Err(err) => Err(err),
        };

        let mut stats = self.stats.write().await;
        match &outcome {
            Ok(result) => {
                if result.chain_id != chain_id {
                    tracing::warn!(
                        chain = %chain_id,
                        reported = %result.chain_id,
                        "Adapter reported a different chain id"
                    );
                }
                stats.record_success(chain_id, result);
                tracing::info!(
                    chain = %chain_id,
                    batch = batch.batch_index,
                    tx = %result.tx_ref.short(),
                    gas_cost = result.gas_cost,
                    "Batch settled"
                );
            }
            Err(_) => stats.record_failure(chain_id),
        }
        outcome
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    pub async fn get_stats(&self) -> SettlementStats {
        self.stats.read().await.snapshot()
    }

    /// Share of successful batches per chain, in percent.
    pub async fn get_chain_usage_percentage(&self) -> BTreeMap<ChainId, Decimal> {
        self.stats.read().await.usage_percentage()
    }

    pub async fn report(&self) -> SettlementReport {
        let stats = self.stats.read().await;
        SettlementReport {
            generated_at: self.clock.now(),
            strategy: self.strategy,
            registered_chains: self.chains(),
            connected_chains: self.connected_chains(),
            stats: stats.snapshot(),
            usage_percentage: stats.usage_percentage(),
        }
    }
}

fn summarize(action: &str, results: Vec<(ChainId, Result<()>)>) -> ConnectionSummary {
    let mut summary = ConnectionSummary::default();
    for (chain_id, result) in results {
        match result {
            Ok(()) => summary.succeeded.push(chain_id),
            Err(err) => {
                tracing::warn!(chain = %chain_id, action, error = %err, "Adapter call failed");
                summary.failed.push((chain_id, err.to_string()));
            }
        }
    }
    summary
}

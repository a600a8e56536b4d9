//! In-process settlement backend over a [`RollupLedger`].
//!
//! Each `LedgerAdapter` simulates one settlement chain: a fee model
//! ([`ChainConditions`]), a connection flag, and the chain's own rollup
//! ledger. A submission commits the batch's state root on the ledger as the
//! configured sequencer. The ledger stays reachable through [`LedgerAdapter::ledger`]
//! so challengers, the arbiter and the finalizer act on the same state.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rollup_ledger::RollupLedger;
use rollup_types::{
    Address, Amount, BatchSubmission, ChainDescriptor, ChainMetrics, Clock, CommitmentId, Result,
    RollupError, SettlementResult, TxHash, constants,
};
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};

use crate::adapter::ChainAdapter;
use crate::metrics_cache::MetricsCache;

/// Fee and performance model of a simulated chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConditions {
    /// Gas of a settlement transaction carrying zero transactions.
    pub base_gas: u64,
    /// Additional gas per batched transaction.
    pub gas_per_tx: u64,
    /// Price of one gas unit.
    pub gas_price: Amount,
    pub block_time: Duration,
    pub finalization_time: Duration,
    /// Congestion in percent.
    pub load: u8,
}

impl ChainConditions {
    /// Gas units needed to settle `tx_count` transactions.
    #[must_use]
    pub fn gas_units(&self, tx_count: usize) -> u64 {
        let per_tx = self
            .gas_per_tx
            .saturating_mul(u64::try_from(tx_count).unwrap_or(u64::MAX));
        self.base_gas.saturating_add(per_tx)
    }

    #[must_use]
    pub fn cost(&self, gas_units: u64) -> Amount {
        Amount::from(gas_units).saturating_mul(self.gas_price)
    }

    fn metrics(&self) -> ChainMetrics {
        ChainMetrics {
            gas_cost: self.cost(self.base_gas),
            block_time: self.block_time,
            finalization_time: self.finalization_time,
            load: self.load,
        }
    }
}

/// [`ChainAdapter`] backed by an in-process [`RollupLedger`].
pub struct LedgerAdapter {
    descriptor: ChainDescriptor,
    sequencer: Address,
    ledger: Arc<Mutex<RollupLedger>>,
    conditions: RwLock<ChainConditions>,
    connected: AtomicBool,
    /// When false, every RPC fails as if the node were unreachable.
    reachable: AtomicBool,
    cache: MetricsCache,
    metrics_fetches: AtomicU64,
    submissions: Mutex<HashMap<TxHash, CommitmentId>>,
}

impl LedgerAdapter {
    /// Adapter over `ledger`, committing as `sequencer`.
    #[must_use]
    pub fn new(
        descriptor: ChainDescriptor,
        conditions: ChainConditions,
        sequencer: Address,
        ledger: Arc<Mutex<RollupLedger>>,
        metrics_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            descriptor,
            sequencer,
            ledger,
            conditions: RwLock::new(conditions),
            connected: AtomicBool::new(false),
            reachable: AtomicBool::new(true),
            cache: MetricsCache::new(metrics_ttl, clock),
            metrics_fetches: AtomicU64::new(0),
            submissions: Mutex::new(HashMap::new()),
        }
    }

    /// Shared handle to the chain's ledger.
    #[must_use]
    pub fn ledger(&self) -> Arc<Mutex<RollupLedger>> {
        Arc::clone(&self.ledger)
    }

    /// Simulate the node going away (`false`) or coming back (`true`).
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Replace the fee model. Cached metrics are dropped.
    pub async fn set_conditions(&self, conditions: ChainConditions) {
        *self.conditions.write().await = conditions;
        self.cache.invalidate().await;
    }

    /// How many times metrics were actually computed (cache misses).
    #[must_use]
    pub fn metrics_fetches(&self) -> u64 {
        self.metrics_fetches.load(Ordering::SeqCst)
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RollupError::ConnectionError {
                chain_id: self.chain_id(),
                reason: "node unreachable".into(),
            })
        }
    }

    async fn fetch_metrics(&self) -> Result<ChainMetrics> {
        self.ensure_reachable()?;
        self.metrics_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.conditions.read().await.metrics())
    }

    /// Deterministic settlement transaction reference.
    fn tx_ref(&self, batch: &BatchSubmission, commitment: CommitmentId) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update(constants::TX_REF_DOMAIN);
        hasher.update(self.chain_id().0.to_le_bytes());
        hasher.update(batch.batch_index.to_le_bytes());
        hasher.update(batch.batch_root.as_bytes());
        hasher.update(commitment.0.to_le_bytes());
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&hasher.finalize());
        TxHash(hash)
    }
}

#[async_trait]
impl ChainAdapter for LedgerAdapter {
    fn descriptor(&self) -> &ChainDescriptor {
        &self.descriptor
    }

    async fn connect(&self) -> Result<()> {
        self.ensure_reachable()?;
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!(chain = %self.chain_id(), name = %self.descriptor.name, "Connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        self.cache.invalidate().await;
        tracing::info!(chain = %self.chain_id(), "Disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn submit_batch(&self, batch: &BatchSubmission) -> Result<SettlementResult> {
        let chain_id = self.chain_id();
        if !self.is_connected() {
            return Err(RollupError::NotConnected(chain_id));
        }
        self.ensure_reachable()?;
        if !batch.verify_root() {
            return Err(RollupError::SubmissionError {
                chain_id,
                reason: format!("batch {} root does not match its contents", batch.batch_index),
            });
        }

        let conditions = self.conditions.read().await.clone();
        let gas = conditions.gas_units(batch.tx_count());
        if gas > self.descriptor.gas_limit {
            return Err(RollupError::SubmissionError {
                chain_id,
                reason: format!("gas {gas} exceeds limit {}", self.descriptor.gas_limit),
            });
        }

        let commitment =
            self.ledger
                .lock()
                .await
                .commit_state(self.sequencer, batch.batch_index, batch.state_root)?;

        let tx_ref = self.tx_ref(batch, commitment);
        self.submissions.lock().await.insert(tx_ref, commitment);
        self.cache.invalidate().await;

        Ok(SettlementResult {
            success: true,
            chain_id,
            tx_ref,
            gas_cost: conditions.cost(gas),
            finalization_time: conditions.finalization_time,
        })
    }

    async fn verify_batch_submission(&self, tx_ref: &TxHash) -> Result<bool> {
        self.ensure_reachable()?;
        Ok(self.submissions.lock().await.contains_key(tx_ref))
    }

    async fn estimate_gas_cost(&self, batch: &BatchSubmission) -> Result<Amount> {
        self.ensure_reachable()?;
        let conditions = self.conditions.read().await;
        Ok(conditions.cost(conditions.gas_units(batch.tx_count())))
    }

    async fn get_metrics(&self) -> Result<ChainMetrics> {
        self.cache.get_or_fetch(|| self.fetch_metrics()).await
    }
}

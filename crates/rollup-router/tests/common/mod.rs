//! Scripted adapter shared by the router integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rollup_router::{ChainAdapter, RoutingStrategy, SettlementRouter};
use rollup_types::*;

/// Fails every submission.
pub const ALWAYS: u32 = u32::MAX;

/// Deterministic fake chain. Behaviour is fixed at construction; counters
/// are shared so tests can inspect them after the router takes ownership.
pub struct FakeAdapter {
    descriptor: ChainDescriptor,
    cost: Amount,
    finalization: Duration,
    load: u8,
    broken_estimates: bool,
    broken_metrics: bool,
    refuse_connect: bool,
    reports_failure: bool,
    /// Chain id written into results, if it differs from the descriptor's.
    reported_chain: Option<ChainId>,
    failures_left: AtomicU32,
    connected: AtomicBool,
    submit_calls: Arc<AtomicU32>,
}

impl FakeAdapter {
    pub fn new(chain: u64, cost: Amount) -> Self {
        Self {
            descriptor: ChainDescriptor::new(ChainId(chain), format!("fake-{chain}"), 1, u64::MAX),
            cost,
            finalization: Duration::from_secs(60),
            load: 0,
            broken_estimates: false,
            broken_metrics: false,
            refuse_connect: false,
            reports_failure: false,
            reported_chain: None,
            failures_left: AtomicU32::new(0),
            connected: AtomicBool::new(false),
            submit_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn finalization(mut self, secs: u64) -> Self {
        self.finalization = Duration::from_secs(secs);
        self
    }

    pub fn load(mut self, load: u8) -> Self {
        self.load = load;
        self
    }

    /// The first `n` submissions fail with a transient error ([`ALWAYS`] for every one).
    pub fn failing_submits(self, n: u32) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn broken_estimates(mut self) -> Self {
        self.broken_estimates = true;
        self
    }

    pub fn broken_metrics(mut self) -> Self {
        self.broken_metrics = true;
        self
    }

    pub fn refuse_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    /// Submissions return `success == false` instead of an error.
    pub fn reports_failure(mut self) -> Self {
        self.reports_failure = true;
        self
    }

    /// Results claim to come from `chain`.
    pub fn reports_chain(mut self, chain: u64) -> Self {
        self.reported_chain = Some(ChainId(chain));
        self
    }

    /// Handle on the submission counter.
    pub fn calls(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.submit_calls)
    }

    fn unavailable(&self, what: &str) -> RollupError {
        RollupError::ConnectionError {
            chain_id: self.chain_id(),
            reason: format!("{what} unavailable"),
        }
    }
}

#[async_trait]
impl ChainAdapter for FakeAdapter {
    fn descriptor(&self) -> &ChainDescriptor {
        &self.descriptor
    }

    async fn connect(&self) -> Result<()> {
        if self.refuse_connect {
            return Err(self.unavailable("node"));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn submit_batch(&self, batch: &BatchSubmission) -> Result<SettlementResult> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                0 => None,
                ALWAYS => Some(ALWAYS),
                n => Some(n - 1),
            })
            .is_ok();
        if fail {
            return Err(RollupError::SubmissionError {
                chain_id: self.chain_id(),
                reason: "execution reverted".into(),
            });
        }
        Ok(SettlementResult {
            success: !self.reports_failure,
            chain_id: self.reported_chain.unwrap_or_else(|| self.chain_id()),
            tx_ref: TxHash(batch.batch_root.0),
            gas_cost: self.cost,
            finalization_time: self.finalization,
        })
    }

    async fn verify_batch_submission(&self, _tx_ref: &TxHash) -> Result<bool> {
        Ok(true)
    }

    async fn estimate_gas_cost(&self, _batch: &BatchSubmission) -> Result<Amount> {
        if self.broken_estimates {
            return Err(self.unavailable("gas oracle"));
        }
        Ok(self.cost)
    }

    async fn get_metrics(&self) -> Result<ChainMetrics> {
        if self.broken_metrics {
            return Err(self.unavailable("metrics"));
        }
        Ok(ChainMetrics {
            gas_cost: self.cost,
            block_time: Duration::from_secs(2),
            finalization_time: self.finalization,
            load: self.load,
        })
    }
}

/// Config with no backoff so retry tests run instantly.
pub fn fast_config(max_retries: u32) -> RouterConfig {
    RouterConfig {
        retry: RetryPolicy {
            max_retries,
            backoff: Duration::ZERO,
        },
        ..RouterConfig::default()
    }
}

/// Register `adapters` in order and connect them all.
pub async fn connected_router(
    strategy: RoutingStrategy,
    config: RouterConfig,
    adapters: Vec<FakeAdapter>,
) -> SettlementRouter {
    let mut router = SettlementRouter::new(strategy, config);
    for adapter in adapters {
        router.register_adapter(Box::new(adapter)).unwrap();
    }
    router.connect().await;
    router
}

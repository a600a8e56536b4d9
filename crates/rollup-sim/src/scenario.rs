//! The simulated settlement network and the scripted run over it.

use std::sync::Arc;
use std::time::Duration;

use rollup_ledger::RollupLedger;
use rollup_router::{
    ChainAdapter, ChainConditions, LedgerAdapter, RoutingStrategy, SettlementReport,
    SettlementRouter,
};
use rollup_types::{
    Address, BatchSubmission, ChainDescriptor, ChainId, Clock, LedgerConfig, ManualClock, Result,
    RollupError, RouterConfig, StateRoot, TxHash,
};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

/// Knobs of one simulation run.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub batches: u64,
    pub txs_per_batch: usize,
    /// Batch during which the cheapest chain is unreachable.
    pub outage_batch: u64,
    pub strategy: RoutingStrategy,
    pub router: RouterConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            batches: 6,
            txs_per_batch: 25,
            outage_batch: 3,
            strategy: RoutingStrategy::Balanced,
            router: RouterConfig::default(),
        }
    }
}

struct SimChain {
    name: &'static str,
    chain_id: ChainId,
    conditions: ChainConditions,
}

fn chains() -> Vec<SimChain> {
    let conditions = |gas_price, finalization_secs, load| ChainConditions {
        base_gas: 21_000,
        gas_per_tx: 2_100,
        gas_price,
        block_time: Duration::from_secs(2),
        finalization_time: Duration::from_secs(finalization_secs),
        load,
    };
    vec![
        SimChain {
            name: "ethereum",
            chain_id: ChainId(1),
            conditions: conditions(30_000_000_000, 7_200, 65),
        },
        SimChain {
            name: "polygon",
            chain_id: ChainId(137),
            conditions: conditions(2_000_000_000, 1_800, 40),
        },
        SimChain {
            name: "arbitrum",
            chain_id: ChainId(42_161),
            conditions: conditions(100_000_000, 600, 25),
        },
    ]
}

fn sequencer() -> Address {
    Address::repeat_byte(0x5e)
}

fn arbiter() -> Address {
    Address::repeat_byte(0xa7)
}

fn challenger() -> Address {
    Address::repeat_byte(0xc4)
}

/// Deterministic batch: transaction hashes and state root derive from the index.
fn batch(index: u64, tx_count: usize, timestamp: chrono::DateTime<chrono::Utc>) -> BatchSubmission {
    let digest = |tag: &[u8], n: u64| {
        let mut hasher = Sha256::new();
        hasher.update(tag);
        hasher.update(index.to_le_bytes());
        hasher.update(n.to_le_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    };
    let transactions = (0..tx_count as u64)
        .map(|n| TxHash(digest(b"sim:tx", n)))
        .collect();
    BatchSubmission::new(index, transactions, StateRoot(digest(b"sim:state", 0)), timestamp)
}

/// Run the scripted scenario and return the router's final report.
///
/// 1. Settle `batches` batches with failover, knocking the cheapest chain
///    offline for `outage_batch`
/// 2. Challenge the first commitment (honestly made, so the challenge is rejected)
/// 3. Fast-forward past the challenge period and finalize every ledger
pub async fn run(scenario: &Scenario) -> Result<SettlementReport> {
    let clock = Arc::new(ManualClock::starting_now());
    let ledger_config = LedgerConfig::new(sequencer(), arbiter());
    let bond = ledger_config.bond_amount;
    let period = ledger_config.challenge_period;

    let mut router = SettlementRouter::with_clock(scenario.strategy, scenario.router.clone(), clock.clone());
    let mut adapters = Vec::new();
    for sim in chains() {
        let mut ledger = RollupLedger::new(ledger_config.clone(), clock.clone());
        ledger.deposit_bond(sequencer(), bond.saturating_mul(2));
        ledger.deposit_bond(challenger(), bond);
        let adapter = Arc::new(LedgerAdapter::new(
            ChainDescriptor::new(sim.chain_id, sim.name, 1, 30_000_000),
            sim.conditions,
            sequencer(),
            Arc::new(Mutex::new(ledger)),
            scenario.router.metrics_ttl,
            clock.clone(),
        ));
        router.register_adapter(Box::new(Arc::clone(&adapter)))?;
        adapters.push(adapter);
    }

    let summary = router.connect().await;
    tracing::info!(connected = summary.succeeded.len(), failed = summary.failed.len(), "Network up");

    let cheapest = router
        .analyze_batch(&batch(0, scenario.txs_per_batch, clock.now()))
        .await?
        .first()
        .map(|d| d.chain_id)
        .ok_or(RollupError::NoAvailableChains)?;

    let mut first_settlement = None;
    for index in 1..=scenario.batches {
        let outage = index == scenario.outage_batch;
        let cheapest_adapter = adapters.iter().find(|a| a.descriptor().chain_id == cheapest);
        if let Some(adapter) = cheapest_adapter {
            adapter.set_reachable(!outage);
        }

        let next = batch(index, scenario.txs_per_batch, clock.now());
        match router.submit_batch_with_failover(&next).await {
            Ok(result) => {
                tracing::info!(batch = index, chain = %result.chain_id, outage, "Batch routed");
                first_settlement.get_or_insert(result.chain_id);
            }
            Err(err) => tracing::warn!(batch = index, error = %err, "Batch not settled"),
        }
        clock.advance(Duration::from_secs(60));
    }
    for adapter in &adapters {
        adapter.set_reachable(true);
    }

    if let Some(chain_id) = first_settlement {
        if let Some(adapter) = adapters.iter().find(|a| a.descriptor().chain_id == chain_id) {
            let ledger = adapter.ledger();
            let mut ledger = ledger.lock().await;
            let challenge = ledger.challenge_state(
                challenger(),
                rollup_types::CommitmentId(0),
                StateRoot::default(),
                StateRoot([0xff; 32]),
                b"claimed invalid transition".to_vec(),
            )?;
            let outcome = ledger.resolve_challenge(arbiter(), challenge, false)?;
            tracing::info!(chain = %chain_id, %outcome, "Dispute resolved");
        }
    }

    clock.advance(period + Duration::from_secs(1));
    for adapter in &adapters {
        let ledger = adapter.ledger();
        let mut ledger = ledger.lock().await;
        let finalized = ledger.finalize_states();
        ledger.verify_bond_conservation()?;
        tracing::info!(
            chain = %adapter.descriptor().chain_id,
            finalized = finalized.len(),
            "Ledger finalized"
        );
    }

    router.disconnect().await;
    Ok(router.report().await)
}

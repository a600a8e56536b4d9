//! # rollup-router
//!
//! **Routing plane**: picks the settlement chain for each rollup batch and
//! gets it accepted there.
//!
//! ## Architecture
//!
//! - [`ChainAdapter`]: capability trait every settlement backend implements
//! - [`MetricsCache`]: per-adapter TTL cache of chain metrics
//! - [`scoring`]: integer-normalized cost / time / load sub-scores
//! - [`RoutingStrategy`]: cost-optimized, speed-optimized or balanced selection
//! - [`SettlementRouter`]: registry, concurrent analysis, retry, failover, statistics
//! - [`LedgerAdapter`]: in-process backend over a `rollup_ledger::RollupLedger`
//!
//! ## Two weightings
//!
//! Batch analysis and failover rank chains with 0.5 cost / 0.3 time / 0.2 load.
//! The `Balanced` strategy behind `submit_batch` uses 0.4 / 0.4 / 0.2. Both
//! live in `rollup_types::ScoringConfig`.

pub mod adapter;
pub mod ledger_adapter;
pub mod metrics_cache;
pub mod router;
pub mod scoring;
pub mod stats;
pub mod strategy;

pub use adapter::{ChainAdapter, ChainQuote};
pub use ledger_adapter::{ChainConditions, LedgerAdapter};
pub use metrics_cache::MetricsCache;
pub use router::{ConnectionSummary, SettlementRouter};
pub use stats::{ChainStats, SettlementReport, SettlementStats, StatsTracker};
pub use strategy::RoutingStrategy;

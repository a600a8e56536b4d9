//! Settlement simulation.
//!
//! Routes a run of batches across three simulated chains, knocks the
//! preferred chain offline for one batch, disputes a commitment and
//! finalizes every ledger once the challenge period has passed.
//!
//! Usage:
//! ```text
//! rollup-sim [router-config.json]
//! RUST_LOG=debug rollup-sim
//! ```

mod scenario;

use rollup_types::{Result, RollupError, RouterConfig, constants};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::scenario::Scenario;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let mut scenario = Scenario::default();
    if let Some(path) = std::env::args().nth(1) {
        let json = std::fs::read_to_string(&path)
            .map_err(|e| RollupError::Configuration(format!("{path}: {e}")))?;
        scenario.router = RouterConfig::from_json(&json)?;
        tracing::info!(%path, "Loaded router config");
    }

    tracing::info!(
        version = constants::VERSION,
        strategy = %scenario.strategy,
        batches = scenario.batches,
        outage_batch = scenario.outage_batch,
        "Starting settlement simulation"
    );
    let report = scenario::run(&scenario).await?;
    println!("{}", report.to_json()?);
    Ok(())
}

//! System-wide constants for the rollup settlement core.

/// Default bond a sequencer must hold to commit, and a challenger must post
/// to challenge (in the smallest unit of the settlement asset).
pub const DEFAULT_BOND_AMOUNT: u128 = 1_000_000_000_000_000_000;

/// Default challenge period in seconds (7 days).
pub const DEFAULT_CHALLENGE_PERIOD_SECS: u64 = 7 * 24 * 60 * 60;

/// Default TTL of a cached chain metrics snapshot in seconds.
pub const DEFAULT_METRICS_TTL_SECS: u64 = 30;

/// Default number of retries after the first failed submission attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default fixed backoff between submission attempts in milliseconds.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 5_000;

/// Sub-score above which a decision reason mentions that dimension.
pub const DEFAULT_REASON_THRESHOLD: u32 = 70;

/// Upper bound of every score and sub-score.
pub const MAX_SCORE: u32 = 100;

/// Cost reported for a chain whose gas estimation failed.
///
/// Large enough to lose every cost comparison against a chain that answered.
pub const PESSIMISTIC_GAS_COST: u128 = 10u128.pow(30);

/// Finalization time (seconds) reported for a chain whose metrics query failed.
pub const PESSIMISTIC_FINALIZATION_SECS: u64 = DEFAULT_CHALLENGE_PERIOD_SECS;

/// Block time (seconds) reported for a chain whose metrics query failed.
pub const PESSIMISTIC_BLOCK_TIME_SECS: u64 = 600;

/// Load (percent) reported for a chain whose metrics query failed.
pub const PESSIMISTIC_LOAD: u8 = 100;

/// Domain separator for batch roots.
pub const BATCH_ROOT_DOMAIN: &[u8] = b"rollup:batch_root:v1:";

/// Domain separator for settlement transaction references.
pub const TX_REF_DOMAIN: &[u8] = b"rollup:settlement_tx:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

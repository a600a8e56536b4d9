//! Per-adapter chain metrics cache.
//!
//! Metrics are read on every analysis and every strategy selection, so each
//! adapter keeps the last successful fetch for a short TTL. The TTL is the
//! only source of staleness: adapters invalidate the entry after every
//! successful submission, since their own load just changed.
//!
//! Every invalidation bumps a generation counter. A fetch that was already
//! in flight when the entry was invalidated returns its result to the caller
//! but does not store it.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rollup_types::{ChainMetrics, Clock, Result};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CachedMetrics {
    metrics: ChainMetrics,
    fetched_at: DateTime<Utc>,
}

/// Single-entry TTL cache of [`ChainMetrics`].
pub struct MetricsCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: RwLock<Option<CachedMetrics>>,
    generation: AtomicU64,
}

impl MetricsCache {
    #[must_use]
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entry: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached metrics if fresh, otherwise run `fetch` and cache
    /// its result. Failed fetches are not cached.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<ChainMetrics>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ChainMetrics>>,
    {
        let now = self.clock.now();
        if let Some(cached) = self.entry.read().await.as_ref() {
            if self.is_fresh_at(cached, now) {
                tracing::debug!("Metrics cache hit");
                return Ok(cached.metrics.clone());
            }
        }

        tracing::debug!("Metrics cache miss");
        let generation = self.generation.load(Ordering::SeqCst);
        let metrics = fetch().await?;

        let mut entry = self.entry.write().await;
        if self.generation.load(Ordering::SeqCst) == generation {
            *entry = Some(CachedMetrics {
                metrics: metrics.clone(),
                fetched_at: now,
            });
        } else {
            tracing::debug!("Metrics invalidated during fetch, not caching");
        }
        Ok(metrics)
    }

    /// Drop the cached entry; the next read fetches.
    pub async fn invalidate(&self) {
        let mut entry = self.entry.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        *entry = None;
    }

    /// Whether a cached entry exists and is younger than the TTL.
    pub async fn is_fresh(&self) -> bool {
        let now = self.clock.now();
        self.entry
            .read()
            .await
            .as_ref()
            .is_some_and(|cached| self.is_fresh_at(cached, now))
    }

    fn is_fresh_at(&self, cached: &CachedMetrics, now: DateTime<Utc>) -> bool {
        (now - cached.fetched_at)
            .to_std()
            .is_ok_and(|age| age < self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;

    use rollup_types::{ManualClock, RollupError};

    use super::*;

    fn metrics(load: u8) -> ChainMetrics {
        ChainMetrics {
            gas_cost: 1_000,
            block_time: Duration::from_secs(2),
            finalization_time: Duration::from_secs(60),
            load,
        }
    }

    fn setup() -> (MetricsCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        (MetricsCache::new(Duration::from_secs(30), clock.clone()), clock)
    }

    #[tokio::test]
    async fn second_read_within_ttl_is_cached() {
        let (cache, clock) = setup();
        let counter = AtomicU32::new(0);
        let fetches = &counter;
        let fetch = move || async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok(metrics(10))
        };

        assert_eq!(cache.get_or_fetch(fetch).await.unwrap().load, 10);
        clock.advance(Duration::from_secs(29));
        assert_eq!(cache.get_or_fetch(fetch).await.unwrap().load, 10);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(cache.is_fresh().await);
    }

    #[tokio::test]
    async fn expired_entry_refetches() {
        let (cache, clock) = setup();
        cache.get_or_fetch(|| async { Ok(metrics(10)) }).await.unwrap();
        clock.advance(Duration::from_secs(30));
        assert!(!cache.is_fresh().await);
        let m = cache.get_or_fetch(|| async { Ok(metrics(55)) }).await.unwrap();
        assert_eq!(m.load, 55);
    }

    #[tokio::test]
    async fn invalidate_forces_fetch() {
        let (cache, _) = setup();
        cache.get_or_fetch(|| async { Ok(metrics(10)) }).await.unwrap();
        cache.invalidate().await;
        assert!(!cache.is_fresh().await);
        let m = cache.get_or_fetch(|| async { Ok(metrics(20)) }).await.unwrap();
        assert_eq!(m.load, 20);
    }

    #[tokio::test]
    async fn invalidation_during_fetch_discards_result() {
        let (cache, _) = setup();
        let stale = cache
            .get_or_fetch(|| async {
                // a submission lands while the query is in flight
                cache.invalidate().await;
                Ok(metrics(10))
            })
            .await
            .unwrap();
        assert_eq!(stale.load, 10);
        assert!(!cache.is_fresh().await);

        let m = cache.get_or_fetch(|| async { Ok(metrics(70)) }).await.unwrap();
        assert_eq!(m.load, 70);
        assert!(cache.is_fresh().await);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (cache, _) = setup();
        let err = cache
            .get_or_fetch(|| async { Err(RollupError::Internal("rpc down".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, RollupError::Internal(_)));
        assert!(!cache.is_fresh().await);
        assert!(cache.get_or_fetch(|| async { Ok(metrics(1)) }).await.is_ok());
    }
}

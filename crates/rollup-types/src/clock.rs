//! Injectable time source.
//!
//! The ledger's challenge window and the metrics cache TTL both read time
//! through [`Clock`], so tests can move time forward deterministically with
//! [`ManualClock`] instead of sleeping.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time, clamped so it never goes backwards.
///
/// If the system clock steps back (NTP correction, manual change), `now`
/// keeps returning the latest instant it has already handed out until wall
/// time catches up. A closed challenge window therefore stays closed.
/// Millisecond resolution.
#[derive(Debug, Default)]
pub struct SystemClock {
    last_ms: AtomicI64,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let wall_ms = Utc::now().timestamp_millis();
        let previous = self.last_ms.fetch_max(wall_ms, Ordering::SeqCst);
        DateTime::from_timestamp_millis(previous.max(wall_ms)).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Clock that only moves when told to. Millisecond resolution.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Start at the given instant.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now_ms: AtomicI64::new(start.timestamp_millis()),
        }
    }

    /// Start at the current wall-clock time.
    #[must_use]
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Move time forward by `by`. Time never moves backwards.
    pub fn advance(&self, by: std::time::Duration) {
        let ms = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.now_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                Some(cur.saturating_add(ms))
            })
            .ok();
    }

    /// Jump to `instant` if it is later than the current time.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.now_ms
            .fetch_max(instant.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms.load(Ordering::SeqCst))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

//! Cache-aside policy for derived rows with a validity window.
//!
//! A cached value is served while `now < valid_until`. Anything else (absent
//! or expired) is a miss that recomputes synchronously. Expiry is never an
//! error and callers never see a stale value.

use crate::errors::Result;
use chrono::{DateTime, TimeDelta, Utc};
use std::future::Future;

/// A cached value that carries its own expiry.
pub trait Expiring {
    /// Instant after which the value must be recomputed.
    fn valid_until(&self) -> DateTime<Utc>;
}

impl Expiring for crate::entities::seat_value_prediction::Model {
    fn valid_until(&self) -> DateTime<Utc> {
        self.valid_until
    }
}

/// How a cache-aside read was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// The cached value was still valid
    Hit,
    /// The value was absent or expired and was recomputed
    Recomputed,
}

/// A value returned by [`CachePolicy::get_or_recompute`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    /// The valid value
    pub value: T,
    /// Whether it came from the cache or a recompute
    pub outcome: CacheOutcome,
}

/// Time-to-live policy for cached derived rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    ttl: TimeDelta,
}

impl CachePolicy {
    /// Creates a policy with the given time-to-live.
    #[must_use]
    pub const fn new(ttl: TimeDelta) -> Self {
        Self { ttl }
    }

    /// Creates a policy whose values stay valid for `days` days.
    #[must_use]
    pub fn days(days: i64) -> Self {
        Self::new(TimeDelta::try_days(days).unwrap_or(TimeDelta::MAX))
    }

    /// Expiry for a value computed at `now`.
    #[must_use]
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether a value expiring at `valid_until` may still be served at `now`.
    #[must_use]
    pub fn is_fresh(valid_until: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now < valid_until
    }

    /// Serves `cached` while it is fresh, otherwise awaits `recompute` exactly once.
    pub async fn get_or_recompute<T, F, Fut>(
        &self,
        cached: Option<T>,
        now: DateTime<Utc>,
        recompute: F,
    ) -> Result<Cached<T>>
    where
        T: Expiring,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match cached {
            Some(value) if Self::is_fresh(value.valid_until(), now) => Ok(Cached {
                value,
                outcome: CacheOutcome::Hit,
            }),
            _ => Ok(Cached {
                value: recompute().await?,
                outcome: CacheOutcome::Recomputed,
            }),
        }
    }
}

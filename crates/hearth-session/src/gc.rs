//! Garbage collection policy: the GC lottery and the expiry predicate.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// `max` used when the configured one is below 1.
const FALLBACK_GC_MAX: i64 = 100;

/// Probabilistic GC trigger, `(odds, max)`.
///
/// Each session open draws a uniform integer in `[0, max)` and runs a sweep
/// when the draw is below `odds`. `odds <= 0` disables GC; `max < 1` is
/// treated as 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcLotto(pub i64, pub i64);

impl Default for GcLotto {
    fn default() -> Self {
        Self(1, 100)
    }
}

impl GcLotto {
    /// Create a lottery with the given odds.
    pub fn new(odds: i64, max: i64) -> Self {
        Self(odds, max)
    }

    /// Winning draws out of `max`.
    pub fn odds(&self) -> i64 {
        self.0
    }

    /// Upper bound of the draw, normalized.
    pub fn max(&self) -> i64 {
        if self.1 < 1 { FALLBACK_GC_MAX } else { self.1 }
    }

    /// Whether the lottery can ever trigger a sweep.
    pub fn is_enabled(&self) -> bool {
        self.0 > 0
    }

    /// Draw once. Returns true when a sweep should run.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        if !self.is_enabled() {
            return false;
        }
        rng.random_range(0..self.max()) < self.odds()
    }
}

/// Filter selecting records idle for longer than `max_lifetime` seconds.
///
/// Matches `last_accessed + max_lifetime < now`; a record exactly
/// `max_lifetime` old is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryFilter {
    /// Allowed idle time in seconds.
    pub max_lifetime: i64,

    /// Reference time in seconds since the epoch.
    pub now: i64,
}

impl ExpiryFilter {
    /// SQL predicate, bound to `(max_lifetime, now)`.
    pub const PREDICATE: &'static str = "last_accessed + ? < ?";

    /// Create a filter.
    pub fn new(max_lifetime: i64, now: i64) -> Self {
        Self { max_lifetime, now }
    }

    /// Whether a record with this `last_accessed` is expired.
    pub fn matches(&self, last_accessed: i64) -> bool {
        last_accessed.saturating_add(self.max_lifetime) < self.now
    }

    /// Parameters for [`Self::PREDICATE`], in binding order.
    pub fn params(&self) -> [i64; 2] {
        [self.max_lifetime, self.now]
    }
}

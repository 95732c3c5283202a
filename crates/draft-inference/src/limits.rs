//! Per-user provider cost guard.
//!
//! Bounds each user's exposure to provider billing with a keyed token-bucket
//! rate limiter: a sustained per-minute rate plus a burst allowance, keyed by
//! user id. Denial is an error surfaced BEFORE any provider call is made.

use std::num::NonZeroU32;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tracing::warn;
use uuid::Uuid;

use draft_core::{defaults, Error, Result};

type UserLimiter = RateLimiter<Uuid, DefaultKeyedStateStore<Uuid>, DefaultClock>;

/// Keyed rate limiter gating outbound provider calls per user.
pub struct CostGuard {
    limiter: UserLimiter,
    per_minute: u32,
    burst: u32,
}

impl CostGuard {
    /// Create a guard allowing `per_minute` sustained calls with a `burst`
    /// allowance on top. Zero values are clamped to 1.
    pub fn new(per_minute: u32, burst: u32) -> Self {
        let rate = NonZeroU32::new(per_minute.max(1)).unwrap_or(NonZeroU32::MIN);
        let burst_cells = NonZeroU32::new(burst.max(1)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(rate).allow_burst(burst_cells);
        Self {
            limiter: RateLimiter::keyed(quota),
            per_minute: per_minute.max(1),
            burst: burst.max(1),
        }
    }

    /// Create a guard with the system defaults, overridable via the
    /// `DRAFT_PROVIDER_CALLS_PER_MINUTE` and `DRAFT_PROVIDER_BURST` env vars.
    pub fn from_env() -> Self {
        let per_minute = defaults::env_u64(
            "DRAFT_PROVIDER_CALLS_PER_MINUTE",
            defaults::PROVIDER_CALLS_PER_MINUTE as u64,
        ) as u32;
        let burst =
            defaults::env_u64("DRAFT_PROVIDER_BURST", defaults::PROVIDER_BURST as u64) as u32;
        Self::new(per_minute, burst)
    }

    /// Check whether the user may make one more provider call.
    ///
    /// Consumes one cell of the user's bucket on success; returns
    /// [`Error::RateLimited`] when the bucket is empty.
    pub fn check(&self, user_id: Uuid) -> Result<()> {
        self.limiter.check_key(&user_id).map_err(|_| {
            warn!(
                subsystem = "inference",
                component = "cost_guard",
                user_id = %user_id,
                per_minute = self.per_minute,
                "Provider call quota exceeded"
            );
            Error::RateLimited(format!(
                "Provider call quota exceeded ({} calls/minute); retry shortly",
                self.per_minute
            ))
        })
    }

    /// Configured sustained rate.
    pub fn per_minute(&self) -> u32 {
        self.per_minute
    }

    /// Configured burst allowance.
    pub fn burst(&self) -> u32 {
        self.burst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_calls_within_burst() {
        let guard = CostGuard::new(60, 5);
        let user = Uuid::new_v4();
        for _ in 0..5 {
            assert!(guard.check(user).is_ok());
        }
    }

    #[test]
    fn rejects_when_burst_exhausted() {
        let guard = CostGuard::new(1, 2);
        let user = Uuid::new_v4();
        assert!(guard.check(user).is_ok());
        assert!(guard.check(user).is_ok());
        let err = guard.check(user).unwrap_err();
        match err {
            Error::RateLimited(msg) => assert!(msg.contains("quota")),
            other => panic!("Expected RateLimited, got {:?}", other),
        }
    }

    #[test]
    fn users_have_independent_buckets() {
        let guard = CostGuard::new(1, 1);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        assert!(guard.check(alice).is_ok());
        assert!(guard.check(alice).is_err());
        // Alice exhausting her bucket does not affect Bob
        assert!(guard.check(bob).is_ok());
    }

    #[test]
    fn zero_config_is_clamped() {
        let guard = CostGuard::new(0, 0);
        assert_eq!(guard.per_minute(), 1);
        assert_eq!(guard.burst(), 1);
        let user = Uuid::new_v4();
        assert!(guard.check(user).is_ok());
    }
}

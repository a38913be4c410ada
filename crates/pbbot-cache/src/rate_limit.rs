//! Fixed-window token buckets keyed by identity.
//!
//! Every identity gets `capacity` uses per `window`. The window starts on the
//! first use and the bucket refills in full once it has passed.

use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::debug;

/// Capacity and refill window of a bucket family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketConfig {
    /// Uses allowed per window.
    pub capacity: u32,
    /// Window length.
    pub window: Duration,
}

impl BucketConfig {
    /// Global per-user command throttle: 5 commands per 5 seconds.
    pub const GLOBAL_COMMANDS: Self = Self::new(5, Duration::from_secs(5));

    /// Per-channel round-trip ping throttle: once per 30 seconds.
    pub const ROUND_TRIP: Self = Self::new(1, Duration::from_secs(30));

    /// Creates a bucket configuration.
    pub const fn new(capacity: u32, window: Duration) -> Self {
        Self { capacity, window }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// The use was counted and may proceed.
    Allowed,
    /// The bucket is empty until `retry_after` has elapsed.
    Limited {
        /// Time until the bucket refills.
        retry_after: Duration,
    },
}

impl RateLimitDecision {
    /// Whether the use may proceed.
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    reset_at: Instant,
    remaining: u32,
}

impl Bucket {
    fn fresh(config: BucketConfig, now: Instant) -> Self {
        Self {
            reset_at: now + config.window,
            remaining: config.capacity,
        }
    }
}

/// Rate limiter holding one bucket per identity.
#[derive(Debug)]
pub struct RateLimiter<K: Eq + Hash> {
    buckets: DashMap<K, Bucket>,
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    /// Creates an empty rate limiter.
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    /// Counts one use for `identity` now.
    pub fn check(&self, identity: K, config: BucketConfig) -> RateLimitDecision {
        self.check_at(identity, config, Instant::now())
    }

    /// Counts one use for `identity` at `now`.
    pub fn check_at(&self, identity: K, config: BucketConfig, now: Instant) -> RateLimitDecision {
        let mut bucket = self
            .buckets
            .entry(identity)
            .or_insert_with(|| Bucket::fresh(config, now));

        if now >= bucket.reset_at {
            *bucket = Bucket::fresh(config, now);
        }

        if bucket.remaining > 0 {
            bucket.remaining -= 1;
            RateLimitDecision::Allowed
        } else {
            RateLimitDecision::Limited {
                retry_after: bucket.reset_at.saturating_duration_since(now),
            }
        }
    }

    /// Drops buckets whose window has already passed. They would be reset on
    /// their next use anyway.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| bucket.reset_at > now);
        let purged = before - self.buckets.len();
        if purged > 0 {
            debug!("Purged {} expired rate-limit buckets", purged);
        }
        purged
    }

    /// Number of identities currently tracked.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no identity is tracked.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for RateLimiter<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbbot_common::{ChannelId, UserId};

    #[test]
    fn test_capacity_then_deny_then_reset() {
        let limiter = RateLimiter::new();
        let config = BucketConfig::GLOBAL_COMMANDS;
        let user = UserId(1);
        let start = Instant::now();

        for i in 0..5 {
            let now = start + Duration::from_millis(i * 100);
            assert_eq!(limiter.check_at(user, config, now), RateLimitDecision::Allowed);
        }

        let sixth = limiter.check_at(user, config, start + Duration::from_secs(1));
        match sixth {
            RateLimitDecision::Limited { retry_after } => {
                assert!(retry_after > Duration::ZERO);
                assert_eq!(retry_after, Duration::from_secs(4));
            }
            RateLimitDecision::Allowed => panic!("sixth call within the window must be denied"),
        }

        let after_window = start + Duration::from_secs(5);
        assert!(limiter.check_at(user, config, after_window).is_allowed());
    }

    #[test]
    fn test_identities_do_not_share_buckets() {
        let limiter = RateLimiter::new();
        let config = BucketConfig::ROUND_TRIP;
        let now = Instant::now();

        assert!(limiter.check_at(ChannelId(1), config, now).is_allowed());
        assert!(!limiter.check_at(ChannelId(1), config, now).is_allowed());
        assert!(limiter.check_at(ChannelId(2), config, now).is_allowed());
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn test_window_starts_at_first_use() {
        let limiter = RateLimiter::new();
        let config = BucketConfig::ROUND_TRIP;
        let start = Instant::now();

        assert!(limiter.check_at(ChannelId(7), config, start).is_allowed());
        let denied = limiter.check_at(ChannelId(7), config, start + Duration::from_secs(29));
        assert_eq!(
            denied,
            RateLimitDecision::Limited {
                retry_after: Duration::from_secs(1)
            }
        );
        assert!(limiter
            .check_at(ChannelId(7), config, start + Duration::from_secs(30))
            .is_allowed());
    }

    #[test]
    fn test_zero_capacity_always_denies() {
        let limiter = RateLimiter::new();
        let config = BucketConfig::new(0, Duration::from_secs(2));
        let decision = limiter.check_at(UserId(3), config, Instant::now());
        assert_eq!(
            decision,
            RateLimitDecision::Limited {
                retry_after: Duration::from_secs(2)
            }
        );
    }

    #[test]
    fn test_purge_expired() {
        let limiter = RateLimiter::new();
        let config = BucketConfig::GLOBAL_COMMANDS;
        let start = Instant::now();

        limiter.check_at(UserId(1), config, start);
        limiter.check_at(UserId(2), config, start + Duration::from_secs(3));

        assert_eq!(limiter.purge_expired(start + Duration::from_secs(6)), 1);
        assert_eq!(limiter.len(), 1);
    }
}

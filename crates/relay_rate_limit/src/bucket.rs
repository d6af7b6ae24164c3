//! Token bucket rate limiter with lazy refill.
//!
//! The bucket never runs a background timer. Every call computes how many
//! whole tokens the elapsed time has earned and adds them, capped at capacity.
//! When no whole token has been earned the refill timestamp is left alone, so
//! frequent polling cannot starve the refill.

use crate::{RateLimitError, RateLimitErrorKind, RateLimitResult};
use derive_getters::Getters;
use parking_lot::Mutex;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, trace};

/// Shape of a token bucket.
///
/// # Example
///
/// ```
/// use relay_rate_limit::BucketConfig;
/// use std::num::NonZeroU32;
///
/// let config = BucketConfig::per_minute(NonZeroU32::new(30).unwrap());
/// assert_eq!(config.capacity().get(), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct BucketConfig {
    capacity: NonZeroU32,
    refill_rate: NonZeroU32,
    refill_interval: Duration,
}

impl BucketConfig {
    /// Create a bucket shape, rejecting a zero refill interval.
    pub fn new(
        capacity: NonZeroU32,
        refill_rate: NonZeroU32,
        refill_interval: Duration,
    ) -> RateLimitResult<Self> {
        if refill_interval.is_zero() {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidBucket(
                "refill interval must be greater than zero".to_string(),
            )));
        }
        Ok(Self {
            capacity,
            refill_rate,
            refill_interval,
        })
    }

    /// A bucket holding `requests` tokens that refills `requests` per minute.
    pub fn per_minute(requests: NonZeroU32) -> Self {
        Self {
            capacity: requests,
            refill_rate: requests,
            refill_interval: Duration::from_secs(60),
        }
    }

    /// Nominal time for one token to be earned.
    pub fn time_per_token(&self) -> Duration {
        self.refill_interval / self.refill_rate.get()
    }
}

#[derive(Debug)]
struct TokenBucket {
    config: BucketConfig,
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(config: BucketConfig) -> Self {
        Self {
            config,
            tokens: config.capacity.get(),
            last_refill: Instant::now(),
        }
    }

    /// Add the whole tokens earned since the last refill.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_refill);

        // floor(elapsed / interval * rate), computed in integers to stay exact
        let earned = elapsed.as_nanos() * u128::from(self.config.refill_rate.get())
            / self.config.refill_interval.as_nanos();

        if earned > 0 {
            let capacity = self.config.capacity.get();
            let earned = u32::try_from(earned).unwrap_or(u32::MAX);
            self.tokens = self.tokens.saturating_add(earned).min(capacity);
            self.last_refill = now;
            trace!(earned, tokens = self.tokens, "Refilled token bucket");
        }
    }

    fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }
}

/// A single token bucket shared across tasks.
///
/// Every check-and-decrement happens under one lock, so concurrent callers
/// never consume the same token twice. The lock is never held across an
/// await point.
///
/// # Example
///
/// ```
/// use relay_rate_limit::{BucketConfig, RateLimiter};
/// use std::num::NonZeroU32;
///
/// let limiter = RateLimiter::new(BucketConfig::per_minute(NonZeroU32::new(2).unwrap()));
/// assert!(limiter.allow());
/// assert!(limiter.allow());
/// assert!(!limiter.allow());
/// assert_eq!(limiter.remaining(), 0);
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// Create a limiter that starts with a full bucket.
    pub fn new(config: BucketConfig) -> Self {
        debug!(
            capacity = config.capacity.get(),
            refill_rate = config.refill_rate.get(),
            refill_interval_ms = config.refill_interval.as_millis() as u64,
            "Creating token bucket"
        );
        Self {
            bucket: Mutex::new(TokenBucket::new(config)),
        }
    }

    /// Create a limiter allowing `requests` per minute.
    pub fn per_minute(requests: NonZeroU32) -> Self {
        Self::new(BucketConfig::per_minute(requests))
    }

    /// The bucket shape this limiter was built with.
    pub fn config(&self) -> BucketConfig {
        self.bucket.lock().config
    }

    /// Try to take one token without waiting.
    ///
    /// Returns false, leaving the bucket untouched, when none is available.
    pub fn allow(&self) -> bool {
        self.bucket.lock().try_consume()
    }

    /// Wait until a token is available, then take it.
    ///
    /// Sleeps for the nominal time per token between checks and re-checks
    /// after every sleep. Only returns once a token has been consumed.
    #[instrument(level = "debug", skip(self))]
    pub async fn wait_and_consume(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock();
                if bucket.try_consume() {
                    return;
                }
                bucket.config.time_per_token()
            };

            debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Tokens currently available, after a refill pass.
    pub fn remaining(&self) -> u32 {
        let mut bucket = self.bucket.lock();
        bucket.refill();
        bucket.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(capacity: u32, per_minute: u32) -> RateLimiter {
        let config = BucketConfig::new(
            NonZeroU32::new(capacity).unwrap(),
            NonZeroU32::new(per_minute).unwrap(),
            Duration::from_secs(60),
        )
        .unwrap();
        RateLimiter::new(config)
    }

    #[test]
    fn test_zero_interval_rejected() {
        let one = NonZeroU32::new(1).unwrap();
        let err = BucketConfig::new(one, one, Duration::ZERO).unwrap_err();
        assert!(matches!(err.kind(), RateLimitErrorKind::InvalidBucket(_)));
    }

    #[test]
    fn test_time_per_token() {
        let config = BucketConfig::per_minute(NonZeroU32::new(5).unwrap());
        assert_eq!(config.time_per_token(), Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_then_denied() {
        let limiter = limiter(5, 5);
        for _ in 0..5 {
            assert!(limiter.allow());
        }
        assert!(!limiter.allow());
        assert_eq!(limiter.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_after_one_token_interval() {
        let limiter = limiter(5, 5);
        for _ in 0..5 {
            assert!(limiter.allow());
        }

        tokio::time::advance(Duration::from_secs(12)).await;
        assert_eq!(limiter.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refill_never_exceeds_capacity() {
        let limiter = limiter(3, 60);
        assert!(limiter.allow());

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(limiter.remaining(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_progress_is_kept() {
        // 1 token per 12s; two 7s steps must add up to one token
        let limiter = limiter(5, 5);
        for _ in 0..5 {
            assert!(limiter.allow());
        }

        tokio::time::advance(Duration::from_secs(7)).await;
        assert_eq!(limiter.remaining(), 0);
        tokio::time::advance(Duration::from_secs(7)).await;
        assert_eq!(limiter.remaining(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_and_consume_blocks_until_refill() {
        let limiter = limiter(1, 5);
        assert!(limiter.allow());

        let start = Instant::now();
        limiter.wait_and_consume().await;
        assert!(start.elapsed() >= Duration::from_secs(12));
        assert_eq!(limiter.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_and_consume_returns_immediately_with_tokens() {
        let limiter = limiter(2, 2);
        let start = Instant::now();
        limiter.wait_and_consume().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.remaining(), 1);
    }
}

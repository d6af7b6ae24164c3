//! Global plus per-key admission control.

use crate::{BucketConfig, RateLimiter};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Per-key ceiling used when none is configured.
pub const DEFAULT_KEY_REQUESTS_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(10) {
    Some(n) => n,
    None => unreachable!(),
};

/// One shared global bucket plus one bucket per destination key.
///
/// Every admission consults the global bucket first. A global denial returns
/// immediately and never creates or touches a per-key bucket. Per-key buckets
/// are created lazily on first use, at most once per key, and are never
/// removed.
///
/// # Example
///
/// ```
/// use relay_rate_limit::{BucketConfig, ScopedLimiter};
/// use std::num::NonZeroU32;
///
/// let limiter = ScopedLimiter::new(
///     BucketConfig::per_minute(NonZeroU32::new(30).unwrap()),
///     BucketConfig::per_minute(NonZeroU32::new(1).unwrap()),
/// );
///
/// assert!(limiter.allow("general"));
/// assert!(!limiter.allow("general"));
/// assert!(limiter.allow("random"));
/// assert_eq!(limiter.key_count(), 2);
/// ```
#[derive(Debug)]
pub struct ScopedLimiter {
    global: RateLimiter,
    key_config: BucketConfig,
    per_key: RwLock<HashMap<String, Arc<RateLimiter>>>,
}

impl ScopedLimiter {
    /// Create a limiter with the given global and per-key bucket shapes.
    pub fn new(global: BucketConfig, per_key: BucketConfig) -> Self {
        Self {
            global: RateLimiter::new(global),
            key_config: per_key,
            per_key: RwLock::new(HashMap::new()),
        }
    }

    /// Global ceiling of `requests_per_minute`, default per-key ceiling.
    pub fn per_minute(requests_per_minute: NonZeroU32) -> Self {
        Self::new(
            BucketConfig::per_minute(requests_per_minute),
            BucketConfig::per_minute(DEFAULT_KEY_REQUESTS_PER_MINUTE),
        )
    }

    /// The shared global bucket.
    pub fn global(&self) -> &RateLimiter {
        &self.global
    }

    /// Try to admit one request for `key` without waiting.
    #[instrument(level = "debug", skip(self))]
    pub fn allow(&self, key: &str) -> bool {
        if !self.global.allow() {
            debug!("Global rate limit reached");
            return false;
        }
        let allowed = self.bucket_for(key).allow();
        if !allowed {
            debug!("Per-key rate limit reached");
        }
        allowed
    }

    /// Wait for the global bucket, then for the key's bucket.
    ///
    /// The two waits are sequential, so a caller may suspend twice.
    #[instrument(level = "debug", skip(self))]
    pub async fn wait_and_consume(&self, key: &str) {
        self.global.wait_and_consume().await;
        let bucket = self.bucket_for(key);
        bucket.wait_and_consume().await;
    }

    /// Tokens left in the key's bucket, creating it if unseen.
    pub fn remaining(&self, key: &str) -> u32 {
        self.bucket_for(key).remaining()
    }

    /// Number of per-key buckets created so far.
    pub fn key_count(&self) -> usize {
        self.per_key.read().len()
    }

    /// The bucket for `key`, created with the per-key shape if unseen.
    ///
    /// Concurrent first use of the same key yields one shared bucket: the
    /// fast path takes a shared lock, the slow path an upgradable lock that
    /// re-checks before upgrading to exclusive.
    pub fn bucket_for(&self, key: &str) -> Arc<RateLimiter> {
        if let Some(bucket) = self.per_key.read().get(key) {
            return Arc::clone(bucket);
        }

        let guard = self.per_key.upgradable_read();
        if let Some(bucket) = guard.get(key) {
            return Arc::clone(bucket);
        }

        let mut map = RwLockUpgradableReadGuard::upgrade(guard);
        debug!(key, "Creating per-key bucket");
        let bucket = map
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::new(self.key_config)));
        Arc::clone(bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(per_minute: u32) -> BucketConfig {
        BucketConfig::per_minute(NonZeroU32::new(per_minute).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_denial_short_circuits() {
        let limiter = ScopedLimiter::new(config(2), config(10));
        assert!(limiter.allow("a"));
        assert!(limiter.allow("b"));

        assert!(!limiter.allow("c"));
        // "c" never reached the per-key stage
        assert_eq!(limiter.key_count(), 2);
        assert_eq!(limiter.remaining("a"), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_key_ceiling_is_independent() {
        let limiter = ScopedLimiter::new(config(30), config(2));
        assert!(limiter.allow("a"));
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        assert!(limiter.allow("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_key_denial_still_spends_global_token() {
        let limiter = ScopedLimiter::new(config(5), config(1));
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        assert_eq!(limiter.global().remaining(), 3);
    }

    #[test]
    fn test_bucket_for_returns_same_instance() {
        let limiter = ScopedLimiter::per_minute(NonZeroU32::new(30).unwrap());
        let first = limiter.bucket_for("general");
        let second = limiter.bucket_for("general");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            first.config().capacity().get(),
            DEFAULT_KEY_REQUESTS_PER_MINUTE.get()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_and_consume_waits_for_key_bucket() {
        let limiter = ScopedLimiter::new(config(30), config(1));
        limiter.wait_and_consume("a").await;

        let start = tokio::time::Instant::now();
        limiter.wait_and_consume("a").await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}

//! Serde configuration sections for admission control and retries.

use crate::{BucketConfig, DEFAULT_KEY_REQUESTS_PER_MINUTE, RateLimiter, RetryPolicy, ScopedLimiter};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

/// The `[rate_limit]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct RateLimitConfig {
    /// Global ceiling across all channels.
    #[serde(default = "default_requests_per_minute")]
    requests_per_minute: NonZeroU32,
    /// Ceiling for each channel.
    #[serde(default = "default_channel_requests_per_minute")]
    channel_requests_per_minute: NonZeroU32,
}

fn default_requests_per_minute() -> NonZeroU32 {
    NonZeroU32::new(30).unwrap_or(NonZeroU32::MIN)
}

fn default_channel_requests_per_minute() -> NonZeroU32 {
    DEFAULT_KEY_REQUESTS_PER_MINUTE
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            channel_requests_per_minute: default_channel_requests_per_minute(),
        }
    }
}

impl RateLimitConfig {
    /// Create a section with explicit ceilings.
    pub fn new(requests_per_minute: NonZeroU32, channel_requests_per_minute: NonZeroU32) -> Self {
        Self {
            requests_per_minute,
            channel_requests_per_minute,
        }
    }

    /// Build the scoped limiter these ceilings describe.
    pub fn build(&self) -> ScopedLimiter {
        ScopedLimiter::new(
            BucketConfig::per_minute(self.requests_per_minute),
            BucketConfig::per_minute(self.channel_requests_per_minute),
        )
    }

    /// Build a single bucket at the global ceiling, for pacing upstream calls.
    pub fn upstream(&self) -> RateLimiter {
        RateLimiter::per_minute(self.requests_per_minute)
    }
}

/// The `[retry]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_max_attempts")]
    max_attempts: usize,
    /// Outer deadline for one retried call.
    #[serde(default = "default_deadline_secs")]
    deadline_secs: u64,
    /// Minimum deadline left for a new attempt to start.
    #[serde(default = "default_min_attempt_budget_ms")]
    min_attempt_budget_ms: u64,
}

fn default_max_attempts() -> usize {
    3
}

fn default_deadline_secs() -> u64 {
    120
}

fn default_min_attempt_budget_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            deadline_secs: default_deadline_secs(),
            min_attempt_budget_ms: default_min_attempt_budget_ms(),
        }
    }
}

impl RetryConfig {
    /// Create a section with explicit limits.
    pub fn new(max_attempts: usize, deadline_secs: u64, min_attempt_budget_ms: u64) -> Self {
        Self {
            max_attempts,
            deadline_secs,
            min_attempt_budget_ms,
        }
    }

    /// The retry policy these limits describe.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.deadline_secs))
            .with_min_attempt_budget(Duration::from_millis(self.min_attempt_budget_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_table() {
        let rate: RateLimitConfig = toml::from_str("").unwrap();
        assert_eq!(rate.requests_per_minute().get(), 30);
        assert_eq!(rate.channel_requests_per_minute().get(), 10);

        let retry: RetryConfig = toml::from_str("").unwrap();
        assert_eq!(retry, RetryConfig::default());
    }

    #[test]
    fn test_zero_rate_rejected() {
        let result: Result<RateLimitConfig, _> = toml::from_str("requests_per_minute = 0");
        assert!(result.is_err());
    }

    #[test]
    fn test_policy_from_section() {
        let retry: RetryConfig = toml::from_str(
            r#"
            max_attempts = 5
            deadline_secs = 30
            min_attempt_budget_ms = 250
            "#,
        )
        .unwrap();
        let policy = retry.policy();
        assert_eq!(*policy.max_attempts(), 5);
        assert_eq!(*policy.deadline(), Duration::from_secs(30));
        assert_eq!(*policy.min_attempt_budget(), Duration::from_millis(250));
    }

    #[test]
    fn test_build_uses_channel_ceiling() {
        let limiter = RateLimitConfig::new(
            NonZeroU32::new(30).unwrap(),
            NonZeroU32::new(3).unwrap(),
        )
        .build();
        assert_eq!(limiter.bucket_for("x").config().capacity().get(), 3);
    }

    #[test]
    fn test_upstream_uses_global_ceiling() {
        let upstream = RateLimitConfig::new(
            NonZeroU32::new(12).unwrap(),
            NonZeroU32::new(3).unwrap(),
        )
        .upstream();
        assert_eq!(upstream.config().capacity().get(), 12);
        assert_eq!(upstream.config().time_per_token(), Duration::from_secs(5));
    }
}

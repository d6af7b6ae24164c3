//! Admission control and error recovery.
//!
//! This crate protects the completion endpoint and the outbound channel from
//! overload, and recovers from transient remote failures:
//!
//! - [`RateLimiter`] - a single token bucket with lazy, elapsed-time refill
//! - [`ScopedLimiter`] - one shared global bucket plus lazily created
//!   per-key buckets, consulted global-first
//! - [`RetryExecutor`] - bounded retries with capped exponential backoff,
//!   an outer deadline and cooperative cancellation
//!
//! Buckets read `tokio::time::Instant`, so tests drive them with tokio's
//! paused clock.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backoff;
mod bucket;
mod config;
mod error;
mod retry;
mod scoped;

pub use backoff::BackoffSchedule;
pub use bucket::{BucketConfig, RateLimiter};
pub use config::{RateLimitConfig, RetryConfig};
pub use error::{RateLimitError, RateLimitErrorKind, RateLimitResult, RetryError, RetryErrorKind};
pub use retry::{RetryExecutor, RetryPolicy};
pub use scoped::{DEFAULT_KEY_REQUESTS_PER_MINUTE, ScopedLimiter};

//! Error types for admission control and retry operations.

use relay_error::{ConfigError, RelayError, RetryableError};
use std::fmt;
use std::time::Duration;

/// Error kinds for limiter construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RateLimitErrorKind {
    /// Bucket parameters that cannot describe a working bucket.
    InvalidBucket(String),
}

impl fmt::Display for RateLimitErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitErrorKind::InvalidBucket(msg) => write!(f, "Invalid bucket: {}", msg),
        }
    }
}

/// Rate limiting error with location tracking.
#[derive(Debug, Clone)]
pub struct RateLimitError {
    kind: RateLimitErrorKind,
    line: u32,
    file: &'static str,
}

impl RateLimitError {
    /// Create a new rate limiting error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rate Limit Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl std::error::Error for RateLimitError {}

impl From<RateLimitError> for RelayError {
    fn from(err: RateLimitError) -> Self {
        RelayError::from(ConfigError::new(err.to_string()))
    }
}

/// Result type for limiter construction.
pub type RateLimitResult<T> = Result<T, RateLimitError>;

/// Ways a retried operation can end without a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryErrorKind<E> {
    /// The caller's cancellation token fired.
    Cancelled,
    /// The outer deadline expired during an attempt or a backoff sleep.
    DeadlineExceeded,
    /// Too little of the deadline remained to start another attempt.
    DeadlineTooShort {
        /// Deadline left when the attempt was refused
        remaining: Duration,
    },
    /// The operation failed with an error that must not be retried.
    NonRetryable(E),
    /// Every allowed attempt failed with a retryable error.
    Exhausted {
        /// Total attempts made, including the first
        attempts: usize,
        /// The last failure observed
        last: E,
    },
}

impl<E: fmt::Display> fmt::Display for RetryErrorKind<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryErrorKind::Cancelled => write!(f, "Cancelled"),
            RetryErrorKind::DeadlineExceeded => write!(f, "Deadline exceeded"),
            RetryErrorKind::DeadlineTooShort { remaining } => write!(
                f,
                "Deadline too short to start an attempt ({} ms left)",
                remaining.as_millis()
            ),
            RetryErrorKind::NonRetryable(err) => write!(f, "Non-retryable error: {}", err),
            RetryErrorKind::Exhausted { attempts, last } => {
                write!(f, "Gave up after {} attempts: {}", attempts, last)
            }
        }
    }
}

/// Failure of a retried operation with location tracking.
#[derive(Debug, Clone)]
pub struct RetryError<E> {
    kind: RetryErrorKind<E>,
    line: u32,
    file: &'static str,
}

impl<E> RetryError<E> {
    /// Create a new retry error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RetryErrorKind<E>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RetryErrorKind<E> {
        &self.kind
    }

    /// Consume the error and return its kind.
    pub fn into_kind(self) -> RetryErrorKind<E> {
        self.kind
    }

    /// True when every attempt was spent on retryable failures.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.kind, RetryErrorKind::Exhausted { .. })
    }

    /// The operation's own error, if the sequence ended on one.
    pub fn last_error(&self) -> Option<&E> {
        match &self.kind {
            RetryErrorKind::NonRetryable(err) => Some(err),
            RetryErrorKind::Exhausted { last, .. } => Some(last),
            _ => None,
        }
    }
}

impl<E: RetryableError> RetryError<E> {
    /// True when the sequence stopped because of cancellation or the deadline.
    pub fn is_cancelled(&self) -> bool {
        match &self.kind {
            RetryErrorKind::Cancelled | RetryErrorKind::DeadlineExceeded => true,
            RetryErrorKind::NonRetryable(err) => err.is_cancellation(),
            _ => false,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Retry Error: {} at line {} in {}",
            self.kind, self.line, self.file
        )
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last_error().map(|err| err as &(dyn std::error::Error + 'static))
    }
}

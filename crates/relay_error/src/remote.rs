//! Remote completion call errors and retry classification.

/// Text fragments that mark a transport failure as transient.
const TRANSIENT_SIGNALS: &[&str] = &["429", "too many requests", "status 5", "timed out", "timeout"];

/// Failure conditions of a single remote completion call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum RemoteErrorKind {
    /// The call exceeded its own timeout
    #[display("Request timed out")]
    Timeout,
    /// The caller aborted the call
    #[display("Request cancelled")]
    Cancelled,
    /// The response stream ended before the body was complete
    #[display("Response stream terminated: {}", _0)]
    StreamTerminated(String),
    /// The endpoint answered with a non-success status
    #[display("HTTP {} error: {}", status_code, message)]
    Status {
        /// HTTP status code
        status_code: u16,
        /// Error message from the body, or the raw body
        message: String,
    },
    /// Connection-level failure before a response arrived
    #[display("Transport error: {}", _0)]
    Transport(String),
    /// The response body could not be decoded
    #[display("Malformed response: {}", _0)]
    MalformedResponse(String),
    /// The request was rejected locally before sending
    #[display("Invalid request: {}", _0)]
    Validation(String),
    /// The endpoint returned no completion choices
    #[display("No completion choices returned")]
    EmptyCompletion,
}

impl RemoteErrorKind {
    /// Check if this error type should be retried.
    ///
    /// Timeouts, truncated streams, rate limiting (429) and server errors (5xx)
    /// are transient. Cancellation, other 4xx statuses, malformed responses and
    /// local validation failures are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteErrorKind::Timeout => true,
            RemoteErrorKind::StreamTerminated(_) => true,
            RemoteErrorKind::Status { status_code, .. } => {
                *status_code == 429 || (500..=599).contains(status_code)
            }
            RemoteErrorKind::Transport(message) => has_transient_signal(message),
            RemoteErrorKind::Cancelled
            | RemoteErrorKind::MalformedResponse(_)
            | RemoteErrorKind::Validation(_)
            | RemoteErrorKind::EmptyCompletion => false,
        }
    }
}

/// Check an error message for a rate-limit or server-error signal.
pub(crate) fn has_transient_signal(message: &str) -> bool {
    let lowered = message.to_lowercase();
    TRANSIENT_SIGNALS.iter().any(|signal| lowered.contains(signal))
}

/// Remote call error with source location tracking.
///
/// # Examples
///
/// ```
/// use relay_error::{RemoteError, RemoteErrorKind, RetryableError};
///
/// let err = RemoteError::new(RemoteErrorKind::Status {
///     status_code: 503,
///     message: "Service unavailable".to_string(),
/// });
/// assert!(err.is_retryable());
///
/// let err = RemoteError::new(RemoteErrorKind::Cancelled);
/// assert!(!err.is_retryable());
/// assert!(err.is_cancellation());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Remote Error: {} at line {} in {}", kind, line, file)]
pub struct RemoteError {
    /// The kind of error that occurred
    pub kind: RemoteErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RemoteError {
    /// Create a new RemoteError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RemoteErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RemoteErrorKind {
        &self.kind
    }
}

/// Trait for errors that support retry classification.
///
/// Implementors decide whether a failed attempt is worth repeating. A retry
/// executor repeats transient failures with backoff and surfaces permanent
/// ones immediately.
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;

    /// Returns true if the failure was an explicit cancellation by the caller.
    fn is_cancellation(&self) -> bool {
        false
    }
}

impl RetryableError for RemoteError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn is_cancellation(&self) -> bool {
        matches!(self.kind, RemoteErrorKind::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> RemoteErrorKind {
        RemoteErrorKind::Status {
            status_code: code,
            message: String::new(),
        }
    }

    #[test]
    fn test_status_classification() {
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(599).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(404).is_retryable());
    }

    #[test]
    fn test_timeout_and_truncation_are_retryable() {
        assert!(RemoteErrorKind::Timeout.is_retryable());
        assert!(RemoteErrorKind::StreamTerminated("unexpected EOF".into()).is_retryable());
    }

    #[test]
    fn test_permanent_kinds() {
        assert!(!RemoteErrorKind::Cancelled.is_retryable());
        assert!(!RemoteErrorKind::MalformedResponse("bad json".into()).is_retryable());
        assert!(!RemoteErrorKind::Validation("empty".into()).is_retryable());
        assert!(!RemoteErrorKind::EmptyCompletion.is_retryable());
    }

    #[test]
    fn test_transport_text_signals() {
        assert!(RemoteErrorKind::Transport("upstream said 429".into()).is_retryable());
        assert!(RemoteErrorKind::Transport("Too Many Requests".into()).is_retryable());
        assert!(RemoteErrorKind::Transport("API error: status 502".into()).is_retryable());
        assert!(!RemoteErrorKind::Transport("dns lookup failed".into()).is_retryable());
    }

    #[test]
    fn test_location_is_captured() {
        let err = RemoteError::new(RemoteErrorKind::Timeout);
        assert!(err.file.ends_with("remote.rs"));
        assert!(format!("{err}").contains("Request timed out"));
    }
}

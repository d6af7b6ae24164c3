//! Bounded retries with capped exponential backoff, an outer deadline and
//! cooperative cancellation.

use crate::{BackoffSchedule, RetryError, RetryErrorKind};
use derive_getters::Getters;
use relay_error::RetryableError;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tokio_retry2::{Retry, RetryError as Step};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Limits applied to one retried operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    max_attempts: usize,
    /// Outer bound on the whole sequence, backoff sleeps included.
    deadline: Duration,
    /// An attempt is not started with less than this much deadline left.
    min_attempt_budget: Duration,
    base_backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            deadline: Duration::from_secs(120),
            min_attempt_budget: Duration::from_millis(500),
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given retry count and deadline and default backoff.
    pub fn new(max_attempts: usize, deadline: Duration) -> Self {
        Self {
            max_attempts,
            deadline,
            ..Self::default()
        }
    }

    /// Set the minimum deadline left for an attempt to start.
    pub fn with_min_attempt_budget(mut self, budget: Duration) -> Self {
        self.min_attempt_budget = budget;
        self
    }

    /// Set the backoff base and cap.
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max;
        self
    }

    /// The delays slept between attempts.
    pub fn schedule(&self) -> BackoffSchedule {
        BackoffSchedule::new(self.max_attempts)
            .base(self.base_backoff)
            .max_delay(self.max_backoff)
    }
}

/// Why a single attempt ended the retry loop.
#[derive(Debug)]
enum AttemptFailure<E> {
    DeadlineTooShort(Duration),
    Operation(E),
}

/// Runs a fallible async operation under a [`RetryPolicy`].
///
/// The operation is attempted up to `max_attempts + 1` times. Between
/// attempts the executor sleeps on the [`BackoffSchedule`]. Errors are
/// classified through [`RetryableError`]: retryable failures are retried,
/// anything else ends the sequence at once.
///
/// The cancellation token and the outer deadline are both observed while an
/// attempt is in flight and during backoff sleeps, so either one ends the
/// sequence promptly.
///
/// # Example
///
/// ```
/// use relay_error::{RemoteError, RemoteErrorKind};
/// use relay_rate_limit::{RetryExecutor, RetryPolicy};
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let executor = RetryExecutor::new(RetryPolicy::new(3, Duration::from_secs(30)));
/// let token = CancellationToken::new();
///
/// let result = executor
///     .execute(|| async { Ok::<_, RemoteError>("done") }, &token)
///     .await;
/// assert_eq!(result.unwrap(), "done");
///
/// let result = executor
///     .execute(
///         || async { Err::<(), _>(RemoteError::new(RemoteErrorKind::Validation("bad".into()))) },
///         &token,
///     )
///     .await;
/// assert!(!result.unwrap_err().is_exhausted());
/// # }
/// ```
#[derive(Debug, Clone, Default, Getters)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create an executor for the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Run `operation` until it succeeds, fails permanently, runs out of
    /// attempts, or is stopped by the deadline or `cancel`.
    #[instrument(
        skip_all,
        fields(
            max_attempts = self.policy.max_attempts,
            deadline_ms = self.policy.deadline.as_millis() as u64
        )
    )]
    pub async fn execute<T, E, F, Fut>(
        &self,
        mut operation: F,
        cancel: &CancellationToken,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + Display,
    {
        if cancel.is_cancelled() {
            return Err(RetryError::new(RetryErrorKind::Cancelled));
        }

        let deadline_at = Instant::now() + self.policy.deadline;
        let min_budget = self.policy.min_attempt_budget;
        let max_attempts = self.policy.max_attempts;
        let schedule = self.policy.schedule();
        let delays = schedule.clone();
        let attempts = AtomicUsize::new(0);
        let attempts_ref = &attempts;

        let driver = Retry::spawn(schedule, || {
            let attempt = attempts_ref.fetch_add(1, Ordering::Relaxed);
            let remaining = deadline_at.saturating_duration_since(Instant::now());
            let call = (remaining >= min_budget).then(|| operation());
            let next_delay = (attempt < max_attempts).then(|| delays.delay_for(attempt + 1));

            async move {
                let Some(call) = call else {
                    warn!(
                        attempt,
                        remaining_ms = remaining.as_millis() as u64,
                        "Not enough deadline left to start another attempt"
                    );
                    return Err(Step::Permanent(AttemptFailure::DeadlineTooShort(remaining)));
                };

                debug!(attempt, "Starting attempt");
                match call.await {
                    Ok(value) => Ok(value),
                    Err(e) if e.is_retryable() => {
                        match next_delay {
                            Some(backoff) => warn!(
                                attempt,
                                backoff_ms = backoff.as_millis() as u64,
                                error = %e,
                                "Transient error, will retry"
                            ),
                            None => warn!(attempt, error = %e, "Transient error, no attempts left"),
                        }
                        Err(Step::Transient {
                            err: AttemptFailure::Operation(e),
                            retry_after: None,
                        })
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "Permanent error, failing immediately");
                        Err(Step::Permanent(AttemptFailure::Operation(e)))
                    }
                }
            }
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Retry sequence cancelled");
                Err(RetryError::new(RetryErrorKind::Cancelled))
            }
            _ = tokio::time::sleep_until(deadline_at) => {
                warn!("Retry deadline exceeded");
                Err(RetryError::new(RetryErrorKind::DeadlineExceeded))
            }
            result = driver => match result {
                Ok(value) => Ok(value),
                Err(AttemptFailure::DeadlineTooShort(remaining)) => {
                    Err(RetryError::new(RetryErrorKind::DeadlineTooShort { remaining }))
                }
                Err(AttemptFailure::Operation(e)) if e.is_retryable() => {
                    Err(RetryError::new(RetryErrorKind::Exhausted {
                        attempts: attempts.load(Ordering::Relaxed),
                        last: e,
                    }))
                }
                Err(AttemptFailure::Operation(e)) => {
                    Err(RetryError::new(RetryErrorKind::NonRetryable(e)))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, Clone, PartialEq)]
    struct FlakyError {
        retryable: bool,
    }

    impl fmt::Display for FlakyError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "flaky (retryable: {})", self.retryable)
        }
    }

    impl RetryableError for FlakyError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    fn executor(max_attempts: usize, deadline_secs: u64) -> RetryExecutor {
        RetryExecutor::new(RetryPolicy::new(
            max_attempts,
            Duration::from_secs(deadline_secs),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_error_runs_max_attempts_plus_one() {
        let calls = AtomicUsize::new(0);
        let token = CancellationToken::new();

        let result = executor(3, 120)
            .execute(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(FlakyError { retryable: true }) }
                },
                &token,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        match err.into_kind() {
            RetryErrorKind::Exhausted { attempts, last } => {
                assert_eq!(attempts, 4);
                assert!(last.retryable);
            }
            other => panic!("expected exhausted, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_runs_once() {
        let calls = AtomicUsize::new(0);
        let token = CancellationToken::new();

        let result = executor(3, 120)
            .execute(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(FlakyError { retryable: false }) }
                },
                &token,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let err = result.unwrap_err();
        assert!(!err.is_exhausted());
        assert!(matches!(err.kind(), RetryErrorKind::NonRetryable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_between_attempts() {
        let start = Instant::now();
        let token = CancellationToken::new();

        let _ = executor(3, 120)
            .execute(
                || async { Err::<(), _>(FlakyError { retryable: true }) },
                &token,
            )
            .await;

        // 1s + 2s + 4s of backoff
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicUsize::new(0);
        let token = CancellationToken::new();

        let result = executor(3, 120)
            .execute(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err(FlakyError { retryable: true })
                        } else {
                            Ok(n)
                        }
                    }
                },
                &token,
            )
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let calls = AtomicUsize::new(0);
        let token = CancellationToken::new();
        let exec = executor(3, 120);

        let run = exec.execute(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(FlakyError { retryable: true }) }
            },
            &token,
        );
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            token.cancel();
        };

        let (result, ()) = tokio::join!(run, cancel);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result.unwrap_err().kind(),
            RetryErrorKind::Cancelled
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_never_calls() {
        let calls = AtomicUsize::new(0);
        let token = CancellationToken::new();
        token.cancel();

        let result = executor(3, 120)
            .execute(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, FlakyError>(()) }
                },
                &token,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires_during_backoff() {
        let calls = AtomicUsize::new(0);
        let token = CancellationToken::new();
        let exec = RetryExecutor::new(RetryPolicy::new(3, Duration::from_millis(2500)));

        let result = exec
            .execute(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(FlakyError { retryable: true }) }
                },
                &token,
            )
            .await;

        // attempts at t=0s and t=1s, second backoff would end at t=3s
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let err = result.unwrap_err();
        assert!(matches!(err.kind(), RetryErrorKind::DeadlineExceeded));
        assert!(err.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires_during_slow_call() {
        let token = CancellationToken::new();
        let exec = RetryExecutor::new(RetryPolicy::new(3, Duration::from_secs(5)));
        let start = Instant::now();

        let result = exec
            .execute(
                || async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok::<_, FlakyError>(())
                },
                &token,
            )
            .await;

        assert!(matches!(
            result.unwrap_err().kind(),
            RetryErrorKind::DeadlineExceeded
        ));
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_refused_when_deadline_nearly_spent() {
        let calls = AtomicUsize::new(0);
        let token = CancellationToken::new();
        let policy = RetryPolicy::new(3, Duration::from_secs(2))
            .with_min_attempt_budget(Duration::from_millis(1500));

        let result = RetryExecutor::new(policy)
            .execute(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(FlakyError { retryable: true }) }
                },
                &token,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match result.unwrap_err().into_kind() {
            RetryErrorKind::DeadlineTooShort { remaining } => {
                assert_eq!(remaining, Duration::from_secs(1));
            }
            other => panic!("expected deadline too short, got {:?}", other),
        }
    }
}

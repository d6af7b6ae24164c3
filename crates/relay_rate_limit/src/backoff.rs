//! Capped exponential backoff schedule.

use std::time::Duration;

/// Delays before each retry: `min(cap, base * 2^(n-1))` for retry `n`.
///
/// Yields exactly one delay per allowed retry, so an operation driven by this
/// schedule runs at most `retries + 1` times.
///
/// # Example
///
/// ```
/// use relay_rate_limit::BackoffSchedule;
/// use std::time::Duration;
///
/// let delays: Vec<_> = BackoffSchedule::new(4).collect();
/// assert_eq!(
///     delays,
///     vec![
///         Duration::from_secs(1),
///         Duration::from_secs(2),
///         Duration::from_secs(4),
///         Duration::from_secs(8),
///     ]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    base: Duration,
    max_delay: Duration,
    retries: usize,
    issued: usize,
}

impl BackoffSchedule {
    /// One second base, thirty second cap.
    pub fn new(retries: usize) -> Self {
        Self {
            base: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            retries,
            issued: 0,
        }
    }

    /// Set the delay before the first retry.
    pub fn base(mut self, base: Duration) -> Self {
        self.base = base;
        self
    }

    /// Set the upper bound on any single delay.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay before retry `n` (1-based).
    pub fn delay_for(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(31) as u32;
        self.base
            .checked_mul(1u32 << exponent)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Iterator for BackoffSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.issued >= self.retries {
            return None;
        }
        self.issued += 1;
        Some(self.delay_for(self.issued))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.retries - self.issued;
        (left, Some(left))
    }
}

impl ExactSizeIterator for BackoffSchedule {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_are_capped() {
        let delays: Vec<_> = BackoffSchedule::new(7).collect();
        let secs: Vec<_> = delays.iter().map(Duration::as_secs).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 16, 30, 30]);
    }

    #[test]
    fn test_zero_retries_yields_nothing() {
        assert_eq!(BackoffSchedule::new(0).count(), 0);
    }

    #[test]
    fn test_custom_base_and_cap() {
        let schedule = BackoffSchedule::new(3)
            .base(Duration::from_millis(100))
            .max_delay(Duration::from_millis(250));
        let delays: Vec<_> = schedule.collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(250),
            ]
        );
    }

    #[test]
    fn test_huge_retry_number_saturates_to_cap() {
        let schedule = BackoffSchedule::new(0);
        assert_eq!(schedule.delay_for(200), Duration::from_secs(30));
    }
}

//! Retry Policy (B): exponential backoff with full jitter, classifying
//! retryable vs terminal errors (§4.5).
//!
//! Direct generalization of this crate's internal retry loop shape
//! (same config/metrics split, same `warn!`-on-retry logging) to the
//! gateway's HTTP status classification and `Retry-After` honoring.

use crate::error::Error;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Errors the retry policy knows how to classify and act on.
pub trait Retryable {
    /// Whether this error should be retried.
    fn is_recoverable(&self) -> bool;
    /// A `Retry-After` hint in seconds, if the error carries one.
    fn retry_after_secs(&self) -> Option<u64> {
        None
    }
}

impl Retryable for Error {
    fn is_recoverable(&self) -> bool {
        Error::is_recoverable(self)
    }

    fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Error::RateLimited { retry_after_secs } => *retry_after_secs,
            _ => None,
        }
    }
}

/// Atomic counters for retry attempts, exposed for `statistics()` (§6).
#[derive(Debug, Default)]
pub struct RetryMetrics {
    attempts: AtomicU64,
    succeeded_after_retry: AtomicU64,
    exhausted: AtomicU64,
}

impl RetryMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, succeeded: bool, retried: bool) {
        if retried && succeeded {
            self.succeeded_after_retry.fetch_add(1, Ordering::Relaxed);
        } else if !succeeded {
            self.exhausted.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn exhausted(&self) -> u64 {
        self.exhausted.load(Ordering::Relaxed)
    }
}

/// Retry schedule configuration. Defaults match §4.5: `base=1s`,
/// `max_attempts=3`, full jitter bounded at ±25%, `Retry-After` honored up
/// to a 30s cap.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub jitter_factor: f64,
    pub retry_after_cap: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            jitter_factor: 0.25,
            retry_after_cap: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, d: Duration) -> Self {
        self.base_delay = d;
        self
    }
}

/// Drives the attempt loop: compute backoff, sleep, re-invoke. Holds no
/// per-call state beyond the shared metrics, so a single policy instance
/// can be reused concurrently across requests.
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay before attempt `i` (1-indexed): `base * 2^(i-1) +
    /// U(-0.25,+0.25) * base * 2^(i-1)`, i.e. full jitter bounded at ±25%
    /// of the unjittered delay (§4.5, tested by §8.8).
    #[must_use]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exp_delay = self.config.base_delay * 2u32.pow(attempt.saturating_sub(1));
        let jitter_range = exp_delay.as_secs_f64() * self.config.jitter_factor;
        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range;
        let adjusted = (exp_delay.as_secs_f64() + jitter).max(0.0);
        Duration::from_secs_f64(adjusted)
    }

    /// Delay honoring a `Retry-After` hint, clamped to the 30s cap (§4.5).
    #[must_use]
    pub fn delay_for_retry_after(&self, hint_secs: u64) -> Duration {
        Duration::from_secs(hint_secs).min(self.config.retry_after_cap)
    }

    /// Execute `operation`, retrying recoverable errors up to
    /// `max_attempts`, honoring `Retry-After` hints when present.
    ///
    /// # Errors
    ///
    /// Returns the final error once attempts are exhausted or the error is
    /// terminal.
    pub async fn execute<F, T, E, Fut>(&self, metrics: &RetryMetrics, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Debug,
    {
        let mut attempt = 0;
        loop {
            metrics.record_attempt();
            match operation().await {
                Ok(value) => {
                    metrics.record_outcome(true, attempt > 0);
                    return Ok(value);
                }
                Err(err) => {
                    attempt += 1;
                    if !err.is_recoverable() || attempt >= self.config.max_attempts {
                        metrics.record_outcome(false, attempt > 1);
                        return Err(err);
                    }

                    let delay = match err.retry_after_secs() {
                        Some(secs) => self.delay_for_retry_after(secs),
                        None => self.calculate_delay(attempt),
                    };

                    warn!(
                        attempt,
                        max_attempts = self.config.max_attempts,
                        ?delay,
                        "llm gateway retrying after recoverable error: {:?}",
                        err
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fake {
        recoverable: bool,
    }
    impl Retryable for Fake {
        fn is_recoverable(&self) -> bool {
            self.recoverable
        }
    }

    #[test]
    fn delay_is_within_jitter_bounds() {
        let policy = RetryPolicy::new(RetryConfig::default());
        for attempt in 1..=3 {
            let delay = policy.calculate_delay(attempt).as_secs_f64();
            let base = 2f64.powi(attempt as i32 - 1);
            assert!(delay >= 0.75 * base - 1e-9, "attempt {attempt}: {delay}");
            assert!(delay <= 1.25 * base + 1e-9, "attempt {attempt}: {delay}");
        }
    }

    #[test]
    fn retry_after_is_capped_at_30s() {
        let policy = RetryPolicy::new(RetryConfig::default());
        assert_eq!(policy.delay_for_retry_after(1000), Duration::from_secs(30));
        assert_eq!(policy.delay_for_retry_after(5), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let policy = RetryPolicy::new(RetryConfig::default().with_base_delay(Duration::from_millis(1)));
        let metrics = RetryMetrics::new();
        let calls = std::sync::atomic::AtomicU32::new(0);
        let result: Result<(), Fake> = policy
            .execute(&metrics, || {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Err(Fake { recoverable: true }) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.exhausted(), 1);
    }

    #[tokio::test]
    async fn terminal_error_does_not_retry() {
        let policy = RetryPolicy::new(RetryConfig::default());
        let metrics = RetryMetrics::new();
        let calls = std::sync::atomic::AtomicU32::new(0);
        let result: Result<(), Fake> = policy
            .execute(&metrics, || {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Err(Fake { recoverable: false }) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}

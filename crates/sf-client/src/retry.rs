//! Transport-level retry.
//!
//! Only `429`, `500`/`502`/`503`/`504` and connection failures are retried.
//! A response carrying a Salesforce error body is final. Layers above the
//! transport see one outcome per request.

use rand::Rng;
use std::time::Duration;

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt. `0` sends every request once.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any computed delay.
    pub max_delay: Duration,
    pub backoff: BackoffStrategy,
    /// Longest `Retry-After` that is honored as sent; longer values are
    /// clamped. `None` ignores the header.
    pub max_retry_after: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff: BackoffStrategy::Jittered { factor: 2 },
            max_retry_after: Some(Duration::from_secs(60)),
        }
    }
}

impl RetryConfig {
    /// Send each request once.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Ignore `Retry-After` and always use the backoff schedule.
    pub fn ignoring_retry_after(mut self) -> Self {
        self.max_retry_after = None;
        self
    }
}

/// Delay schedule between retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Always `base_delay`.
    Fixed,
    /// `base_delay * factor^retry`.
    Exponential { factor: u32 },
    /// Exponential, plus up to the same amount again at random, so that
    /// concurrent cursors hitting a rate limit spread out.
    Jittered { factor: u32 },
}

impl BackoffStrategy {
    /// Delay before retry number `retry` (0 for the first retry).
    pub fn delay(&self, retry: u32, base: Duration, max: Duration) -> Duration {
        let exponential = |factor: u32| base.saturating_mul(factor.saturating_pow(retry));

        let delay = match *self {
            BackoffStrategy::Fixed => base,
            BackoffStrategy::Exponential { factor } => exponential(factor),
            BackoffStrategy::Jittered { factor } => {
                let step = exponential(factor);
                step.saturating_add(step.mul_f64(rand::rng().random::<f64>()))
            }
        };
        delay.min(max)
    }
}

/// Retry state for one request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    retries: u32,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config, retries: 0 }
    }

    /// Retries performed so far.
    pub fn attempt(&self) -> u32 {
        self.retries
    }

    pub fn should_retry(&self) -> bool {
        self.retries < self.config.max_retries
    }

    /// Count a retry and return how long to wait first, or `None` once the
    /// budget is spent. A server-sent `retry_after` wins over the schedule.
    pub fn next_delay(&mut self, retry_after: Option<Duration>) -> Option<Duration> {
        if !self.should_retry() {
            return None;
        }

        let delay = match (retry_after, self.config.max_retry_after) {
            (Some(requested), Some(cap)) => requested.min(cap),
            _ => self
                .config
                .backoff
                .delay(self.retries, self.config.base_delay, self.config.max_delay),
        };

        self.retries += 1;
        Some(delay)
    }
}

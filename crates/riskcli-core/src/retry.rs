//! Retry logic with exponential backoff and jitter.
//!
//! The policy is pure: [`Backoff::window`] maps a retry number to the range a
//! delay is drawn from, and [`Backoff::sample`] draws from it with a caller
//! supplied RNG. Sleeping happens in the fetcher, never here.

use std::time::Duration;

/// Closed range `[min, max]` a retry delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    pub min: Duration,
    pub max: Duration,
}

impl DelayWindow {
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    pub fn contains(&self, delay: Duration) -> bool {
        delay >= self.min && delay <= self.max
    }
}

/// Backoff strategy for retrying failed requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Uses an exponential delay between retries.
    ///
    /// The base delay is `base * (factor ^ retry)` capped at `max`; a random
    /// jitter in `[0, jitter_ratio * delay]` is then added on top.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum base delay before jitter.
        max: Duration,
        /// Upper bound of the added jitter, as a fraction of the base delay.
        jitter_ratio: f64,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(500),
            factor: 2.0,
            max: Duration::from_secs(8),
            jitter_ratio: 0.5,
        }
    }
}

impl Backoff {
    /// Range of possible delays before retry number `retry` (0-based).
    pub fn window(self, retry: u32) -> DelayWindow {
        match self {
            Self::Fixed { delay } => DelayWindow::fixed(delay),
            Self::Exponential {
                base,
                factor,
                max,
                jitter_ratio,
            } => {
                let scale = factor.powi(retry.min(i32::MAX as u32) as i32);
                let seconds = (base.as_secs_f64() * scale).min(max.as_secs_f64());
                let delay = Duration::from_secs_f64(seconds.max(0.0));
                let jitter = Duration::from_secs_f64(seconds.max(0.0) * jitter_ratio.max(0.0));

                DelayWindow {
                    min: delay,
                    max: delay + jitter,
                }
            }
        }
    }

    /// Draw a delay for retry number `retry` using `rng`.
    pub fn sample(self, retry: u32, rng: &mut fastrand::Rng) -> Duration {
        let window = self.window(retry);
        let spread_ms = window.max.saturating_sub(window.min).as_millis() as u64;
        if spread_ms == 0 {
            return window.min;
        }
        window.min + Duration::from_millis(rng.u64(0..=spread_ms))
    }
}

/// Configuration for the automatic retry mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first call.
    pub max_attempts: u32,
    /// The backoff strategy to use between attempts.
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    /// Exponential backoff with the default curve and `max_attempts` attempts.
    pub fn exponential(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Create a new retry configuration with fixed backoff.
    pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Fixed { delay },
        }
    }

    /// Single attempt, never retry.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub const fn has_attempts_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay range before the attempt following `attempt` (1-based).
    pub fn window_after_attempt(&self, attempt: u32) -> DelayWindow {
        self.backoff.window(attempt.saturating_sub(1))
    }

    /// Sampled delay before the attempt following `attempt` (1-based).
    pub fn delay_after_attempt(&self, attempt: u32, rng: &mut fastrand::Rng) -> Duration {
        self.backoff.sample(attempt.saturating_sub(1), rng)
    }
}

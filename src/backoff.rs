//! Retry backoff timer
//!
//! Produces increasing wait intervals between retries of one logical request,
//! with symmetric jitter to avoid thundering-herd synchronization against a
//! rate-limited service. One timer instance is scoped to one request's retry
//! sequence and discarded afterward.

use crate::config::BackoffConfig;
use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;

/// Stateful backoff timer threaded through one request's retry loop.
///
/// The delay grows multiplicatively from `initial_delay` up to `max_delay`;
/// each new deadline is jittered by a symmetric fraction of the delay.
#[derive(Debug)]
pub(crate) struct BackoffTimer {
    config: BackoffConfig,
    num_retries: u32,
    backoff: Duration,
    deadline: Instant,
}

impl BackoffTimer {
    /// Create a timer with its first deadline one initial delay from now.
    pub(crate) fn new(config: BackoffConfig) -> Self {
        let backoff = config.initial_delay;
        Self {
            num_retries: 0,
            backoff,
            deadline: Instant::now() + backoff,
            config,
        }
    }

    /// Time remaining until the current deadline; zero once it has passed.
    ///
    /// Non-blocking read, used to size per-attempt timeouts so slow attempts
    /// still yield to the retry clock.
    pub(crate) fn time_until_deadline(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Number of retries performed so far.
    pub(crate) fn num_retries(&self) -> u32 {
        self.num_retries
    }

    /// Current un-jittered backoff value.
    #[cfg(test)]
    pub(crate) fn current_backoff(&self) -> Duration {
        self.backoff
    }

    /// Sleep until the current deadline, then grow the backoff and set the
    /// next (jittered) deadline.
    pub(crate) async fn advance(&mut self) {
        tokio::time::sleep_until(self.deadline).await;

        self.backoff = self
            .backoff
            .mul_f64(self.config.multiplier)
            .min(self.config.max_delay);

        let unit: f64 = rand::thread_rng().gen_range(-1.0..=1.0);
        self.deadline = Instant::now() + jittered(self.backoff, self.config.jitter, unit);
        self.num_retries += 1;
    }
}

/// Applies symmetric jitter to a delay: `delay * (1 + jitter_fraction * unit)`
/// where `unit` lies in `[-1, 1]`.
///
/// Pure helper so jitter bounds can be verified with injected values.
fn jittered(delay: Duration, jitter_fraction: f64, unit: f64) -> Duration {
    delay.mul_f64(1.0 + jitter_fraction * unit)
}

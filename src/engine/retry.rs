//! Retry with exponential backoff for transport failures.
//!
//! Lives with the caller (the worker), not in the fetcher: a fetcher makes exactly one request.
//! With the default `max_retries = 0` every task gets a single attempt.

use log::debug;
use std::time::{Duration, Instant};

use super::fetch::Fetch;
use crate::pipeline::StopFlag;
use crate::utils::config::{RetryDefaults, STOP_POLL_INTERVAL};
use crate::{FetchOutcome, Task};

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: RetryDefaults::MAX_RETRIES,
            initial_backoff: Duration::from_millis(RetryDefaults::INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(RetryDefaults::MAX_BACKOFF_MS),
            multiplier: RetryDefaults::MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based), capped at `max_backoff`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(i32::MAX as u32) as i32);
        let secs = self.initial_backoff.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max_backoff.as_secs_f64() {
            return self.max_backoff;
        }
        Duration::from_secs_f64(secs).min(self.max_backoff)
    }

    /// Fetch `task`, retrying transport errors up to `max_retries` times. HTTP status errors are
    /// returned as-is. Gives up early (returning the last outcome) when a stop is requested.
    pub fn fetch_with_retry(
        &self,
        fetcher: &dyn Fetch,
        task: &Task,
        stop: &StopFlag,
    ) -> FetchOutcome {
        let mut outcome = fetcher.fetch(task);
        let mut attempt = 0;
        while attempt < self.max_retries && outcome.status.is_transient() {
            let delay = self.backoff_for(attempt);
            debug!(
                "Retrying {} in {:?} (retry {}/{})",
                task.title,
                delay,
                attempt + 1,
                self.max_retries
            );
            if !sleep_unless_stopped(delay, stop) {
                break;
            }
            attempt += 1;
            outcome = fetcher.fetch(task);
        }
        outcome
    }
}

/// Sleep for `delay` in short slices. Returns false if a stop was requested meanwhile.
fn sleep_unless_stopped(delay: Duration, stop: &StopFlag) -> bool {
    let deadline = Instant::now() + delay;
    loop {
        if stop.is_requested() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(STOP_POLL_INTERVAL));
    }
}

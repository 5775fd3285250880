//! Retry policy: classifying retryable failures and computing backoff delay.
//!
//! Mirrors the shape of the teacher's `RetryConfig`/`calculate_backoff` in
//! `models::router`, but the classification rule and the jitter term are
//! specific to this gateway (see module docs on [`RetryPolicy`]).

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

/// The outcome of a single outbound attempt, as seen by the retry policy.
///
/// The policy only needs to know whether the failure is one of the two
/// retryable shapes; everything else (malformed response, local
/// programming error, already-surfaced connection refusal) is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The outbound call did not complete within the per-attempt timeout.
    TransportTimeout,
    /// The backend responded with an HTTP status.
    HttpStatus(u16),
    /// Any other failure shape: never retried.
    Other,
}

/// Configuration for retrying failed outbound requests.
///
/// # Defaults
///
/// `max_retries: 3`, `base_delay_ms: 1000`, `max_delay_ms: 5000`,
/// `retryable_statuses: {500, 502, 503, 504}`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 5000,
            retryable_statuses: vec![500, 502, 503, 504],
        }
    }
}

/// Stateless retry classifier and backoff calculator.
///
/// Safe to share across concurrent requests: every method is a pure
/// function of its arguments and the (immutable, per-gateway) config.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Returns true iff `attempt < maxRetries` and the outcome is a
    /// transport timeout or an HTTP status in `retryableStatuses`.
    ///
    /// `attempt` counts retries already spent: `0` on the first retry
    /// decision (after the initial attempt has failed), `1` after the
    /// first retry has also failed, and so on. With `maxRetries: 3` this
    /// allows retries for `attempt` `0`, `1`, `2` — three retries in total,
    /// on top of the initial attempt — matching spec §4.1's total of
    /// `maxRetries + 1` outbound calls.
    pub fn should_retry(&self, outcome: AttemptOutcome, attempt: u32) -> bool {
        if attempt >= self.config.max_retries {
            return false;
        }
        match outcome {
            AttemptOutcome::TransportTimeout => true,
            AttemptOutcome::HttpStatus(status) => {
                self.config.retryable_statuses.contains(&status)
            }
            AttemptOutcome::Other => false,
        }
    }

    /// The backoff delay for `attempt`: `min(maxDelay, baseDelay * 2^attempt)
    /// + jitter`, `jitter` uniform in `[0, 10)` ms.
    fn delay_ms(&self, attempt: u32) -> u64 {
        let exponential = self
            .config
            .base_delay_ms
            .saturating_mul(1u64 << attempt.min(32));
        let capped = exponential.min(self.config.max_delay_ms);
        let jitter: u64 = rand::thread_rng().gen_range(0..10);
        capped + jitter
    }

    /// Sleeps for [`Self::delay_ms`] worth of time.
    pub async fn delay(&self, attempt: u32) {
        sleep(Duration::from_millis(self.delay_ms(attempt))).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 5000,
            retryable_statuses: vec![500, 502, 503, 504],
        })
    }

    #[test]
    fn retries_transport_timeout_within_budget() {
        let p = policy();
        assert!(p.should_retry(AttemptOutcome::TransportTimeout, 0));
        assert!(p.should_retry(AttemptOutcome::TransportTimeout, 2));
        assert!(!p.should_retry(AttemptOutcome::TransportTimeout, 3));
    }

    #[test]
    fn retries_only_configured_statuses() {
        let p = policy();
        assert!(p.should_retry(AttemptOutcome::HttpStatus(503), 0));
        assert!(!p.should_retry(AttemptOutcome::HttpStatus(400), 0));
        assert!(!p.should_retry(AttemptOutcome::HttpStatus(404), 0));
    }

    #[test]
    fn never_retries_other_failures() {
        let p = policy();
        for attempt in 0..5 {
            assert!(!p.should_retry(AttemptOutcome::Other, attempt));
        }
    }

    #[test]
    fn delay_is_capped_and_bounded_by_jitter() {
        let p = policy();
        for attempt in 0..6 {
            let d = p.delay_ms(attempt);
            assert!(d <= p.config.max_delay_ms + 10);
        }
    }

    #[test]
    fn delay_grows_until_the_cap() {
        let p = policy();
        // Strip jitter by comparing the capped-exponential term directly.
        let exp = |attempt: u32| {
            p.config
                .base_delay_ms
                .saturating_mul(1u64 << attempt)
                .min(p.config.max_delay_ms)
        };
        assert!(exp(0) <= exp(1));
        assert!(exp(1) <= exp(2));
        assert_eq!(exp(2), p.config.max_delay_ms);
        assert_eq!(exp(5), p.config.max_delay_ms);
    }
}

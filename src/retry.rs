//! Bounded retry with configurable backoff.
//!
//! Every remote call in mobihue that is allowed to retry does so through a
//! [`RetryPolicy`] value: the transit fetch uses a flat delay, the Hue bridge
//! calls use exponential backoff with jitter. The policy decides *when* to
//! retry; the caller decides *what* is retryable via a predicate.

use std::thread;
use std::time::Duration;

use rand::Rng;

/// Delay strategy between retry attempts.
#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    /// Fixed delay between attempts.
    Flat(Duration),
    /// Base delay doubling on each attempt, plus up to 50% jitter.
    Exponential { base: Duration },
}

/// Bounded retry policy applied uniformly at call sites.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, the first try included. Never zero.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn flat(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Flat(delay),
        }
    }

    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential { base },
        }
    }

    /// Delay to sleep after the given zero-based failed attempt.
    fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Flat(delay) => delay,
            Backoff::Exponential { base } => {
                let scaled = base.saturating_mul(1u32 << attempt.min(16));
                let jitter_ms = rand::thread_rng().gen_range(0..=scaled.as_millis() as u64 / 2);
                scaled + Duration::from_millis(jitter_ms)
            }
        }
    }

    /// Run `op` until it succeeds, the error is not retryable, or the
    /// attempt budget is exhausted. The last error is returned as-is.
    ///
    /// `on_retry` is invoked before each re-attempt with the upcoming
    /// attempt number (2-based, matching "try 2 of 3" log lines).
    pub fn run<T, E>(
        &self,
        mut op: impl FnMut() -> Result<T, E>,
        is_retryable: impl Fn(&E) -> bool,
        mut on_retry: impl FnMut(u32, &E),
    ) -> Result<T, E> {
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt + 1 >= self.max_attempts || !is_retryable(&err) {
                        return Err(err);
                    }
                    on_retry(attempt + 2, &err);
                    thread::sleep(self.delay_after(attempt));
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_first_success() {
        let policy = RetryPolicy::flat(3, Duration::ZERO);
        let mut calls = 0;
        let result: Result<u32, &str> = policy.run(
            || {
                calls += 1;
                Ok(7)
            },
            |_| true,
            |_, _| {},
        );
        assert_eq!(result, Ok(7));
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_up_to_budget_then_propagates() {
        let policy = RetryPolicy::flat(3, Duration::ZERO);
        let mut calls = 0;
        let result: Result<(), &str> = policy.run(
            || {
                calls += 1;
                Err("boom")
            },
            |_| true,
            |_, _| {},
        );
        assert_eq!(result, Err("boom"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn non_retryable_errors_fail_immediately() {
        let policy = RetryPolicy::flat(3, Duration::ZERO);
        let mut calls = 0;
        let result: Result<(), &str> = policy.run(
            || {
                calls += 1;
                Err("fatal")
            },
            |_| false,
            |_, _| {},
        );
        assert_eq!(result, Err("fatal"));
        assert_eq!(calls, 1);
    }

    #[test]
    fn succeeds_on_later_attempt() {
        let policy = RetryPolicy::flat(3, Duration::ZERO);
        let mut calls = 0;
        let result: Result<u32, &str> = policy.run(
            || {
                calls += 1;
                if calls < 3 { Err("transient") } else { Ok(42) }
            },
            |_| true,
            |_, _| {},
        );
        assert_eq!(result, Ok(42));
        assert_eq!(calls, 3);
    }
}

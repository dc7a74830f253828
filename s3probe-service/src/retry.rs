//! Bounded retries with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Policy for retrying a failing operation.
///
/// The delay before attempt `n + 1` is `initial_delay * multiplier^(n - 1)`, capped at
/// `max_delay`. Retrying stops once `max_attempts` attempts have been made, or when waiting for
/// the next attempt would exceed `max_elapsed`. Without either ceiling, retries are unbounded.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub max_attempts: Option<u32>,
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
            max_attempts: Some(10),
            max_elapsed: None,
        }
    }
}

/// The final error after a [`RetryPolicy`] gave up.
#[derive(Debug)]
pub struct Exhausted<E> {
    /// Total number of attempts made, including the first one.
    pub attempts: u32,
    /// The error of the last attempt.
    pub error: E,
}

impl RetryPolicy {
    /// Returns the delay to wait after the given number of failed attempts.
    pub fn delay(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);

        if secs.is_finite() && secs < self.max_delay.as_secs_f64() {
            Duration::from_secs_f64(secs)
        } else {
            self.max_delay
        }
    }

    /// Runs `operation` until it succeeds or the policy gives up.
    ///
    /// `on_retry` is invoked with the attempt number, the error and the upcoming delay before
    /// every retry.
    pub async fn retry<T, E, F, Fut>(
        &self,
        mut operation: F,
        mut on_retry: impl FnMut(u32, &E, Duration),
    ) -> Result<T, Exhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let delay = self.delay(attempts);
            let attempts_exhausted = self.max_attempts.is_some_and(|max| attempts >= max);
            let time_exhausted = self
                .max_elapsed
                .is_some_and(|max| start.elapsed() + delay > max);

            if attempts_exhausted || time_exhausted {
                return Err(Exhausted { attempts, error });
            }

            on_retry(attempts, &error, delay);
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay(1), Duration::from_secs(5));
        assert_eq!(policy.delay(2), Duration::from_secs(10));
        assert_eq!(policy.delay(3), Duration::from_secs(20));
        assert_eq!(policy.delay(4), Duration::from_secs(40));
        assert_eq!(policy.delay(5), Duration::from_secs(60));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn constant_delay_with_unit_multiplier() {
        let policy = RetryPolicy {
            multiplier: 1.0,
            ..Default::default()
        };

        assert_eq!(policy.delay(1), Duration::from_secs(5));
        assert_eq!(policy.delay(7), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let policy = RetryPolicy::default();
        let calls = Cell::new(0);
        let mut retries = Vec::new();

        let result = policy
            .retry(
                || {
                    calls.set(calls.get() + 1);
                    let attempt = calls.get();
                    async move { if attempt < 3 { Err("boom") } else { Ok(attempt) } }
                },
                |attempt, _, delay| retries.push((attempt, delay)),
            )
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(
            retries,
            [(1, Duration::from_secs(5)), (2, Duration::from_secs(10))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: Some(4),
            ..Default::default()
        };
        let calls = Cell::new(0);

        let result = policy
            .retry(
                || {
                    calls.set(calls.get() + 1);
                    async { Err::<(), _>("boom") }
                },
                |_, _, _| {},
            )
            .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 4);
        assert_eq!(exhausted.error, "boom");
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_elapsed() {
        let policy = RetryPolicy {
            max_attempts: None,
            max_elapsed: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let start = Instant::now();

        let result = policy
            .retry(|| async { Err::<(), _>("boom") }, |_, _, _| {})
            .await;

        // Waits 5s and 10s, then the next 20s delay would exceed the ceiling.
        assert_eq!(result.unwrap_err().attempts, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }
}

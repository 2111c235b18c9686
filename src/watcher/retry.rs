//! Fixed-delay retry loops for network operations.

use std::future::Future;
use std::time::Duration;

/// Bounded retry policy with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub attempts: u32,
    /// Pause between consecutive attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with `attempts` tries spaced `delay` apart.
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Same attempt count, no pause between attempts.
    pub const fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }
}

/// Runs `operation` until it succeeds or the policy is exhausted.
///
/// Returns the last error together with the number of attempts made.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    operation: F,
) -> std::result::Result<T, (u32, E)>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    with_retry_if(policy, label, |_| true, operation).await
}

/// Like [`with_retry`], but gives up immediately on an error for which
/// `retryable` returns false.
pub async fn with_retry_if<T, E, R, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    retryable: R,
    mut operation: F,
) -> std::result::Result<T, (u32, E)>
where
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= attempts => return Err((attempt, e)),
            Err(e) if !retryable(&e) => {
                log::warn!("{} failed permanently: {}", label, e);
                return Err((attempt, e));
            }
            Err(e) => {
                log::warn!(
                    "{} failed (attempt {}/{}): {}. Waiting {:?} before retry...",
                    label,
                    attempt,
                    attempts,
                    e,
                    policy.delay
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn stops_at_first_success() {
        let calls = Cell::new(0);
        let result: std::result::Result<&str, (u32, String)> =
            with_retry(&RetryPolicy::immediate(3), "op", |_| {
                calls.set(calls.get() + 1);
                async { Ok("done") }
            })
            .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let result: std::result::Result<u32, (u32, String)> =
            with_retry(&RetryPolicy::immediate(5), "op", |attempt| async move {
                if attempt < 3 {
                    Err(format!("boom {attempt}"))
                } else {
                    Ok(attempt)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn reports_last_error_and_attempt_count() {
        let result: std::result::Result<(), (u32, String)> =
            with_retry(&RetryPolicy::immediate(2), "op", |attempt| async move {
                Err(format!("boom {attempt}"))
            })
            .await;
        let (attempts, err) = result.unwrap_err();
        assert_eq!(attempts, 2);
        assert_eq!(err, "boom 2");
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = Cell::new(0);
        let _: std::result::Result<(), (u32, String)> =
            with_retry(&RetryPolicy::immediate(0), "op", |_| {
                calls.set(calls.get() + 1);
                async { Err("no".to_string()) }
            })
            .await;
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn permanent_error_stops_retrying() {
        let calls = Cell::new(0);
        let result: std::result::Result<(), (u32, String)> = with_retry_if(
            &RetryPolicy::immediate(5),
            "op",
            |e: &String| e != "fatal",
            |attempt| {
                calls.set(calls.get() + 1);
                async move { Err(if attempt == 2 { "fatal" } else { "flaky" }.to_string()) }
            },
        )
        .await;
        assert_eq!(result.unwrap_err(), (2, "fatal".to_string()));
        assert_eq!(calls.get(), 2);
    }
}

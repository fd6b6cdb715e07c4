//! Bounded retry with linear backoff.
//!
//! Wraps a single asynchronous operation. Only failures the caller marks as
//! retryable are retried; everything else returns immediately. After the last
//! attempt the error propagates to the tier, which turns it into a
//! [`TierFailure`](crate::TierFailure).

use std::future::Future;

use tracing::debug;

use crate::error::{FetchError, FetchResult};
use crate::types::config::RetryPolicy;

/// Retry `operation` on transient [`FetchError`]s (timeout, reset, abort).
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: F) -> FetchResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FetchResult<T>>,
{
    retry_if(policy, FetchError::is_transient, operation).await
}

/// Retry `operation` while `is_retryable` accepts the error.
///
/// Makes at most `policy.max_retries + 1` calls. Before retry `n` (1-based) it
/// waits `policy.base_delay * n`.
pub async fn retry_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut retries = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if retries < policy.max_retries && is_retryable(&e) => {
                retries += 1;
                let delay = policy.base_delay * retries;
                debug!(
                    attempt = retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn timeout() -> FetchError {
        FetchError::Timeout {
            url: "https://example.com".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_two_timeouts() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::default();

        let result = with_retry(&policy, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(timeout())
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_not_retried() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::default();

        let result: FetchResult<()> = with_retry(&policy, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Status {
                status: 404,
                url: "https://example.com".into(),
            })
        })
        .await;

        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_propagate() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::default();

        let result: FetchResult<()> = with_retry(&policy, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::ConnectionReset {
                url: "https://example.com".into(),
            })
        })
        .await;

        assert!(matches!(result, Err(FetchError::ConnectionReset { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_linear() {
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
        };
        let start = Instant::now();

        let _: FetchResult<()> = with_retry(&policy, || async { Err(timeout()) }).await;

        // 100ms before the second call, 200ms before the third.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(310), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_if_custom_predicate() {
        let calls = AtomicUsize::new(0);
        let policy = RetryPolicy::default();

        let result: Result<(), String> = retry_if(
            &policy,
            |e: &String| e.as_str() == "again",
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("again".to_string())
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let calls = AtomicUsize::new(0);

        let _: FetchResult<()> = with_retry(&RetryPolicy::none(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(timeout())
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

//! Bounded retry with exponential backoff for provider calls

use crate::LlmError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Run `call` once, then up to `max_retries` more times on retryable errors
///
/// Backoff doubles from `base_delay`: 1x, 2x, 4x...
pub(crate) async fn with_retries<T, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    mut call: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                attempt += 1;
                let delay = base_delay * 2u32.saturating_pow(attempt - 1);
                warn!("LLM call failed ({}), retry {}/{} in {:?}", e, attempt, max_retries, delay);
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_success_needs_no_retry() {
        let calls = AtomicU32::new(0);
        let result = with_retries(3, Duration::ZERO, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, LlmError>(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_retried_once() {
        let calls = AtomicU32::new(0);
        let result = with_retries(1, Duration::ZERO, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(LlmError::Communication("connection reset".into()))
            } else {
                Ok("recovered")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries(2, Duration::ZERO, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::RateLimitExceeded)
        })
        .await;
        assert!(matches!(result, Err(LlmError::RateLimitExceeded)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries(5, Duration::ZERO, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Authentication("invalid key".into()))
        })
        .await;
        assert!(matches!(result, Err(LlmError::Authentication(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

//! Runs a provider call under a [`RetryPolicy`].

use std::future::Future;

use crate::domain::{ProviderError, RetryPolicy, ScanError};

/// Call `op` until it succeeds, the policy gives up, or the error is not
/// retryable.
///
/// # Errors
///
/// `ScanError::RetriesExhausted` once a multi-attempt policy runs out,
/// otherwise the provider error itself.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, ScanError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(operation, attempt, "provider call recovered");
                }
                return Ok(value);
            }
            Err(err) if policy.should_retry(attempt, &err) => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts = policy.max_attempts,
                    ?delay,
                    error = %err,
                    "provider call failed, retrying",
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) if policy.max_attempts > 1 && (policy.retryable)(&err) => {
                return Err(ScanError::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                    source: err,
                });
            }
            Err(err) => return Err(ScanError::Provider(err)),
        }
    }
}

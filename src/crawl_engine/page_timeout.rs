//! Timeout utilities for page operations
//!
//! Provides async timeout wrappers to prevent indefinite hangs during
//! page navigation, loading, and other browser operations.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Wrap an async page operation with an explicit timeout.
///
/// The error message distinguishes a timeout from the operation's own
/// failure, which is passed through unchanged.
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout: Duration,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {} seconds",
            timeout.as_secs_f64()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_is_reported_by_name() {
        let result: Result<()> = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            Duration::from_millis(10),
            "Page navigation",
        )
        .await;

        let message = result.expect_err("should time out").to_string();
        assert!(message.starts_with("Page navigation timeout"), "{message}");
    }

    #[tokio::test]
    async fn test_operation_error_passes_through() {
        let result: Result<()> = with_page_timeout(
            async { Err(anyhow::anyhow!("net::ERR_NAME_NOT_RESOLVED")) },
            Duration::from_secs(1),
            "Page navigation",
        )
        .await;

        assert_eq!(
            result.expect_err("should fail").to_string(),
            "net::ERR_NAME_NOT_RESOLVED"
        );
    }
}

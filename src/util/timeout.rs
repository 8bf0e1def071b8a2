//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::ThreadlineError;

/// Wrap a fallible future with a deadline.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, ThreadlineError>>,
) -> Result<T, ThreadlineError> {
    tokio::time::timeout(duration, future)
        .await
        .unwrap_or_else(|_| Err(ThreadlineError::Timeout(duration.as_millis() as u64)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn elapsed_deadline_becomes_timeout_error() {
        let result: Result<(), _> = with_timeout(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(ThreadlineError::Timeout(50))));
    }

    #[tokio::test]
    async fn inner_result_passes_through() {
        let result = with_timeout(Duration::from_secs(1), async { Ok::<_, ThreadlineError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}

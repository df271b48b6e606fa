use std::future::Future;

use kernel::interface::config::LendingConfig;
use kernel::KernelError;

pub use self::{catalog::*, lending::*, stats::*};

mod catalog;
mod lending;
mod stats;

/// Runs `unit` until it succeeds, fails for a non-retryable reason, or the
/// attempt budget is spent. Each call must open and finish its own transaction.
pub(crate) async fn retry_on_conflict<T, F, Fut>(
    config: &LendingConfig,
    operation: &'static str,
    mut unit: F,
) -> error_stack::Result<T, KernelError>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = error_stack::Result<T, KernelError>> + Send,
    T: Send,
{
    let max_attempts = *config.max_attempts();
    let mut attempt = 1;
    loop {
        match unit().await {
            Err(report) if report.current_context().is_retryable() => {
                if attempt >= max_attempts {
                    return Err(report
                        .attach_printable(format!("{operation} gave up after {attempt} attempts")));
                }
                tracing::warn!(operation, attempt, "transaction conflict, retrying");
                tokio::time::sleep(config.delay_for(attempt)).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use error_stack::Report;
    use kernel::interface::config::LendingConfig;
    use kernel::KernelError;

    use crate::service::retry_on_conflict;

    #[tokio::test]
    async fn retries_only_conflicts() {
        let config = LendingConfig::new(3, Duration::from_millis(1));
        let calls = &AtomicU32::new(0);
        let result = retry_on_conflict(&config, "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Report::new(KernelError::OutOfStock))
        })
        .await;
        assert_eq!(
            result.unwrap_err().current_context(),
            &KernelError::OutOfStock
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_budget() {
        let config = LendingConfig::new(3, Duration::from_millis(1));
        let calls = &AtomicU32::new(0);
        let result = retry_on_conflict(&config, "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(Report::new(KernelError::Concurrency))
        })
        .await;
        assert_eq!(
            result.unwrap_err().current_context(),
            &KernelError::Concurrency
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn recovers_after_conflict() {
        let config = LendingConfig::new(5, Duration::from_millis(1));
        let calls = &AtomicU32::new(0);
        let result = retry_on_conflict(&config, "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Report::new(KernelError::Concurrency))
            } else {
                Ok(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}

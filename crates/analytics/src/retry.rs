//! Exponential-backoff retry for store calls made by batch jobs

use backoff::ExponentialBackoffBuilder;
use citegraph_common::{AppError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

fn is_transient(err: &AppError) -> bool {
    matches!(
        err,
        AppError::Database(_) | AppError::DatabaseConnection { .. } | AppError::Internal { .. }
    )
}

/// Retry `op` while it fails with a transient store error, for at most `max_elapsed`.
///
/// Every other error is returned at once.
pub(crate) async fn with_retry<T, F, Fut>(what: &str, max_elapsed: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(100))
        .with_max_elapsed_time(Some(max_elapsed))
        .build();

    backoff::future::retry(policy, || {
        let attempt = op();
        async move {
            attempt.await.map_err(|e: AppError| {
                if is_transient(&e) {
                    warn!(operation = what, error = %e, "Transient store error, retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        }
    })
    .await
}

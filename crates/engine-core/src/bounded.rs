use std::{future::Future, time::Duration};
use tokio::time::timeout;

/// Runs `fut` with an upper bound; `on_timeout` builds the error on expiry.
pub(crate) async fn bounded<T, E, F>(
    limit: Duration,
    fut: F,
    on_timeout: impl FnOnce(Duration) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(limit)),
    }
}

//! Operation deadlines.

use std::future::Future;
use std::time::Duration;

/// Runs `fut` with a deadline, mapping expiry through `on_timeout`.
///
/// The future is dropped on expiry. Store writes are single calls, so a
/// dropped operation either committed its write or did nothing.
pub async fn within<T, E, F>(limit: Duration, fut: F, on_timeout: impl FnOnce(u128) -> E) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(limit_ms = limit.as_millis(), "operation timed out");
            Err(on_timeout(limit.as_millis()))
        }
    }
}

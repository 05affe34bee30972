use std::future::Future;
use std::time::Duration;

/// Await `fut`, failing with a readable error if it takes longer than `limit`.
///
/// Used to turn a would-be deadlock into a test failure instead of a hung
/// test run.
pub async fn within<F, T>(limit: Duration, what: &str, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| anyhow::anyhow!("{what} did not finish within {limit:?}"))
}

//! Time-bounded provider calls.

use std::future::Future;
use std::time::Duration;

use calsync_providers::{ProviderError, ProviderResult};
use tokio::time::timeout;

/// Awaits a provider call, failing with a timeout error after `limit`.
pub(crate) async fn bounded<T, F>(
    limit: Duration,
    operation: &str,
    provider: &str,
    call: F,
) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::timeout(format!(
            "{} timed out after {}s",
            operation,
            limit.as_secs()
        ))
        .with_provider(provider)),
    }
}

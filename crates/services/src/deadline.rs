//! Per-operation deadlines.
//!
//! Dropping the wrapped future on timeout drops its transaction, which rolls
//! back.

use std::future::Future;
use std::time::Duration;

use fitup_core::error::{CoreError, CoreResult};

pub const READ: Duration = Duration::from_secs(5);
pub const WRITE: Duration = Duration::from_secs(10);
pub const EXPORT: Duration = Duration::from_secs(30);

pub async fn read<T>(operation: &'static str, fut: impl Future<Output = CoreResult<T>>) -> CoreResult<T> {
    within(READ, operation, fut).await
}

pub async fn write<T>(operation: &'static str, fut: impl Future<Output = CoreResult<T>>) -> CoreResult<T> {
    within(WRITE, operation, fut).await
}

pub async fn export<T>(operation: &'static str, fut: impl Future<Output = CoreResult<T>>) -> CoreResult<T> {
    within(EXPORT, operation, fut).await
}

pub async fn within<T>(
    limit: Duration,
    operation: &'static str,
    fut: impl Future<Output = CoreResult<T>>,
) -> CoreResult<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(operation, timeout_ms = limit.as_millis() as u64, "Operation deadline exceeded");
            Err(CoreError::Infrastructure(format!(
                "{operation} exceeded its {}s deadline",
                limit.as_secs()
            )))
        }
    }
}

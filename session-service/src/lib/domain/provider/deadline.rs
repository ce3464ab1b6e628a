use std::future::Future;
use std::time::Duration;

use crate::domain::errors::AuthError;

/// Run a store call under an optional deadline.
///
/// On expiry the inner future is dropped, which abandons its I/O, and the
/// call reports `DeadlineExceeded`.
pub async fn with_deadline<T, F>(deadline: Option<Duration>, operation: F) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, AuthError>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, operation)
            .await
            .map_err(|_| AuthError::DeadlineExceeded(limit))?,
        None => operation.await,
    }
}

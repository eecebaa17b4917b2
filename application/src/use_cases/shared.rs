//! Shared utilities for use cases.
//!
//! Cancellation checking and cancellable waiting used by the poll loop
//! and the analysis use case.

use careline_domain::AnalysisError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Check if cancellation has been requested.
///
/// Returns `Err(AnalysisError::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: Option<&CancellationToken>) -> Result<(), AnalysisError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(AnalysisError::Cancelled);
    }
    Ok(())
}

/// Race `future` against the cancellation token.
///
/// On cancellation the future is dropped, which aborts an in-flight
/// request or timer.
pub(crate) async fn cancellable<F: Future>(
    token: Option<&CancellationToken>,
    future: F,
) -> Result<F::Output, AnalysisError> {
    match token {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(AnalysisError::Cancelled),
            output = future => Ok(output),
        },
        None => Ok(future.await),
    }
}

/// Sleep for `delay` unless cancelled first.
pub(crate) async fn sleep_cancellable(
    token: Option<&CancellationToken>,
    delay: Duration,
) -> Result<(), AnalysisError> {
    cancellable(token, tokio::time::sleep(delay)).await
}

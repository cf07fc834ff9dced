//! Timeout enforcement.
//!
//! # Responsibilities
//! - Put a deadline on engine teardown so close() cannot hang
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from the wrapped operation's errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The wrapped operation did not finish in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{operation} did not finish within {deadline:?}")]
pub struct DeadlineExceeded {
    pub operation: &'static str,
    pub deadline: Duration,
}

/// Run `future` with a deadline; the future is dropped if it expires.
pub async fn with_deadline<F, T>(
    operation: &'static str,
    deadline: Duration,
    future: F,
) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(deadline, future).await.map_err(|_| {
        tracing::warn!(operation, deadline_ms = deadline.as_millis() as u64, "Deadline exceeded");
        DeadlineExceeded { operation, deadline }
    })
}

//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap network calls with a deadline
//! - Report which step ran out of time
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

/// A step did not finish before its deadline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{step} timed out after {after:?}")]
pub struct DeadlineExceeded {
    pub step: &'static str,
    pub after: Duration,
}

/// Run `fut`, failing with [`DeadlineExceeded`] if it takes longer than `limit`.
pub async fn with_deadline<F, T>(step: &'static str, limit: Duration, fut: F) -> Result<T, DeadlineExceeded>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| DeadlineExceeded { step, after: limit })
}

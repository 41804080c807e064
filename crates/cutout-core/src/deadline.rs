//! Bounded waits
//!
//! An operation is raced against a timer. Whichever finishes first wins and
//! the other is dropped, so a late result can never be observed.

use std::future::Future;
use std::time::Duration;

/// The timer won the race
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{label} did not finish within {after:?}")]
pub struct DeadlineExceeded {
    pub label: &'static str,
    pub after: Duration,
}

/// Run `operation` for at most `after`
///
/// # Errors
/// Returns [`DeadlineExceeded`] if the timer fires first; the operation is
/// dropped at that point
pub async fn with_deadline<F>(
    label: &'static str,
    after: Duration,
    operation: F,
) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    tokio::time::timeout(after, operation)
        .await
        .map_err(|_| DeadlineExceeded { label, after })
}

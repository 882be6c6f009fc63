//! Timeout enforcement.
//!
//! Every outbound call has a deadline. A call that overruns it is cancelled
//! by dropping its future and reported as [`Elapsed`], which callers classify
//! as the backend being unavailable.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// The deadline passed before the call completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {0:?}")]
pub struct Elapsed(pub Duration);

/// Run `call` with a deadline.
pub async fn with_deadline<F: Future>(deadline: Duration, call: F) -> Result<F::Output, Elapsed> {
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| Elapsed(deadline))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let result = with_deadline(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            1
        })
        .await;
        assert_eq!(result, Err(Elapsed(Duration::from_millis(50))));
    }

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let result = with_deadline(Duration::from_secs(1), async { 7 }).await;
        assert_eq!(result, Ok(7));
    }
}

//! Partial-failure policy shared by every use case.
//!
//! - Primary records and preconditions are fail-fast: callers use `?`.
//! - Enrichment is fail-soft: [`Orchestrator::enrich`] substitutes a stub.
//! - Post-action writes never fail the request: [`Orchestrator::write_or_defer`]
//!   hands failed writes to the retry scheduler.
//! - Once a primary write has landed, its post-action writes run on a
//!   detached task ([`run_detached`]) so a dropped client request cannot
//!   cancel them.

use std::future::Future;

use crate::observability::metrics;
use crate::orchestrator::jobs::{DeferredWrite, PostActionJob};
use crate::orchestrator::{GatewayError, Orchestrator};
use crate::upstream::{BackendClient, UpstreamError, UpstreamResponse};

/// Result of a post-action write's first attempt.
#[derive(Debug)]
pub enum WriteOutcome {
    /// The backend accepted the write.
    Applied(UpstreamResponse),
    /// The write failed and was queued for retry.
    Deferred,
    /// The write failed in a way retrying cannot fix.
    Dropped,
}

impl Orchestrator {
    /// Keep the fetched record, or fall back to `stub` on any failure.
    pub(crate) fn enrich<T>(&self, result: Result<T, UpstreamError>, stub: impl FnOnce() -> T) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(backend = %e.backend(), error = %e, "Enrichment degraded to identifiers only");
                metrics::record_degraded_enrichment(e.backend().as_str());
                stub()
            }
        }
    }

    /// Attempt a post-action write once; on failure queue it for retry.
    pub(crate) async fn write_or_defer(&self, client: &BackendClient, write: DeferredWrite) -> WriteOutcome {
        match client.send(write.request()).await {
            Ok(response) => WriteOutcome::Applied(response),
            Err(e @ (UpstreamError::Unavailable { .. } | UpstreamError::ErrorStatus { .. })) => {
                tracing::warn!(kind = write.kind(), error = %e, "Post-action write failed, deferring");
                self.retries.submit(PostActionJob::new(client.clone(), write));
                WriteOutcome::Deferred
            }
            Err(e) => {
                tracing::error!(kind = write.kind(), error = %e, "Post-action write cannot be retried, dropping");
                WriteOutcome::Dropped
            }
        }
    }
}

/// Run `work` on its own task and wait for it.
///
/// If the caller is dropped while waiting, `work` still runs to completion.
pub(crate) async fn run_detached<T, F>(work: F) -> Result<T, GatewayError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(work).await.map_err(|e| {
        tracing::error!(error = %e, "Detached post-action task failed");
        GatewayError::Internal(e.to_string())
    })
}

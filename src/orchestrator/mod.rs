//! Client-facing use cases composed from backend calls.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → Orchestrator use case
//!         → primary record (fail-fast, error surfaces to the client)
//!         → enrichment (fail-soft, stub with identifiers only)
//!         → post-action writes (failures deferred to the RetryScheduler)
//!     → composite response
//! ```
//!
//! # Design Decisions
//! - Enrichment calls of one request run concurrently; their order is irrelevant
//! - The client may see success before every post-action write has landed
//! - Composite responses are built per request and never cached

pub mod catalog;
pub mod error;
pub mod jobs;
pub mod models;
pub mod pagination;
pub mod policy;
pub mod reservations;

pub use error::GatewayError;
pub use jobs::{AvailabilityChange, DeferredWrite, PostActionJob};
pub use pagination::{Page, PageRequest};
pub use policy::WriteOutcome;

use crate::resilience::RetryScheduler;
use crate::upstream::BackendClient;

/// Implements each client-facing use case.
#[derive(Clone)]
pub struct Orchestrator {
    catalog: BackendClient,
    reputation: BackendClient,
    booking: BackendClient,
    retries: RetryScheduler,
}

impl Orchestrator {
    pub fn new(
        catalog: BackendClient,
        reputation: BackendClient,
        booking: BackendClient,
        retries: RetryScheduler,
    ) -> Self {
        Self {
            catalog,
            reputation,
            booking,
            retries,
        }
    }

    pub fn retries(&self) -> &RetryScheduler {
        &self.retries
    }

    /// Clients in `[catalog, reputation, booking]` order.
    pub fn clients(&self) -> [&BackendClient; 3] {
        [&self.catalog, &self.reputation, &self.booking]
    }
}

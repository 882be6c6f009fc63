//! Post-action writes that may be deferred to the retry scheduler.

use async_trait::async_trait;
use serde_json::json;

use crate::resilience::retries::{Job, JobError};
use crate::upstream::{BackendClient, OutboundRequest};

/// Direction of an availability count change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityChange {
    /// A book was taken.
    Decrement,
    /// A book was returned.
    Increment,
}

impl AvailabilityChange {
    fn path_flag(self) -> &'static str {
        match self {
            AvailabilityChange::Decrement => "0",
            AvailabilityChange::Increment => "1",
        }
    }
}

/// A side effect on a secondary backend, applied after the primary action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredWrite {
    AdjustAvailability {
        book_uid: String,
        change: AvailabilityChange,
    },
    UpdateCondition {
        book_uid: String,
        condition: String,
        date: String,
    },
    AdjustRating {
        username: String,
        stars: i64,
    },
}

impl DeferredWrite {
    pub fn kind(&self) -> &'static str {
        match self {
            DeferredWrite::AdjustAvailability { .. } => "availability-update",
            DeferredWrite::UpdateCondition { .. } => "condition-update",
            DeferredWrite::AdjustRating { .. } => "rating-update",
        }
    }

    /// The outbound request that applies this write.
    pub fn request(&self) -> OutboundRequest {
        match self {
            DeferredWrite::AdjustAvailability { book_uid, change } => OutboundRequest::put(&[
                "api",
                "v1",
                "books",
                book_uid.as_str(),
                "count",
                change.path_flag(),
                "",
            ]),
            DeferredWrite::UpdateCondition {
                book_uid,
                condition,
                date,
            } => OutboundRequest::put(&["api", "v1", "books", book_uid.as_str(), "condition"])
                .json(json!({ "condition": condition, "date": date })),
            DeferredWrite::AdjustRating { username, stars } => {
                OutboundRequest::put(&["api", "v1", "rating", ""])
                    .caller(username)
                    .json(json!({ "stars": stars }))
            }
        }
    }
}

/// A [`DeferredWrite`] bound to the backend that must receive it.
pub struct PostActionJob {
    client: BackendClient,
    write: DeferredWrite,
}

impl PostActionJob {
    pub fn new(client: BackendClient, write: DeferredWrite) -> Self {
        Self { client, write }
    }
}

#[async_trait]
impl Job for PostActionJob {
    fn kind(&self) -> &'static str {
        self.write.kind()
    }

    fn describe(&self) -> String {
        format!("{} {:?}", self.client.backend(), self.write)
    }

    async fn attempt(&self) -> Result<(), JobError> {
        self.client.send(self.write.request()).await?;
        Ok(())
    }
}

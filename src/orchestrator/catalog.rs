//! Pass-through reads: library listing, book listing, rating.

use crate::orchestrator::models::{Book, Library, Rating};
use crate::orchestrator::pagination::{Page, PageRequest};
use crate::orchestrator::{GatewayError, Orchestrator};
use crate::upstream::OutboundRequest;

impl Orchestrator {
    /// Libraries in a city, one page at a time.
    pub async fn list_libraries(&self, city: &str, page: PageRequest) -> Result<Page<Library>, GatewayError> {
        let libraries: Vec<Library> = self
            .catalog
            .fetch(OutboundRequest::get(&["api", "v1", "libraries", ""]).query("city", city))
            .await?;
        Ok(page.apply(libraries))
    }

    /// Books held by a library, one page at a time.
    pub async fn list_books(
        &self,
        library_uid: &str,
        show_all: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Book>, GatewayError> {
        let mut request = OutboundRequest::get(&["api", "v1", "libraries", library_uid, "books", ""]);
        if let Some(show_all) = show_all {
            request = request.query("showAll", show_all);
        }
        let books: Vec<Book> = self.catalog.fetch(request).await?;
        Ok(page.apply(books))
    }

    /// The caller's current rating.
    pub async fn rating(&self, username: &str) -> Result<Rating, GatewayError> {
        let rating = self
            .reputation
            .fetch(OutboundRequest::get(&["api", "v1", "rating", ""]).caller(username))
            .await?;
        Ok(rating)
    }
}

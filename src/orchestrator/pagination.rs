//! Page slicing for list endpoints.

use serde::Serialize;

use crate::config::PaginationConfig;
use crate::orchestrator::error::GatewayError;

/// A validated `page`/`size` pair; pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

impl PageRequest {
    /// Parse raw query values; absent or empty values take the defaults.
    pub fn parse(
        page: Option<&str>,
        size: Option<&str>,
        defaults: &PaginationConfig,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            page: parse_positive("page", page, defaults.default_page)?,
            size: parse_positive("size", size, defaults.default_size)?,
        })
    }

    /// Cut one page out of the full collection.
    pub fn apply<T>(&self, items: Vec<T>) -> Page<T> {
        let total_elements = items.len();
        let start = self.page.saturating_sub(1).saturating_mul(self.size);
        let items = items.into_iter().skip(start).take(self.size).collect();

        Page {
            page: self.page,
            page_size: self.size,
            total_elements,
            items,
        }
    }
}

fn parse_positive(name: &str, raw: Option<&str>, default: usize) -> Result<usize, GatewayError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(value) => match value.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(GatewayError::InvalidRequest(format!(
                "{} must be a positive integer, got '{}'",
                name, value
            ))),
        },
    }
}

/// One page of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page: usize,
    pub page_size: usize,
    pub total_elements: usize,
    pub items: Vec<T>,
}

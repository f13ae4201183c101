//! Pagination utilities
//!
//! Pages are 1-indexed. Requests outside `[1, ..]` are rejected rather than
//! clamped; a page past the end is valid and simply empty.

use crate::{Error, Result};
use serde::Serialize;

/// Default page size for list endpoints
pub const DEFAULT_PER_PAGE: i64 = 100;

/// Validated page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Build a page request; `page` and `per_page` must both be at least 1
    pub fn new(page: i64, per_page: i64) -> Result<Self> {
        if page < 1 {
            return Err(Error::InvalidInput(format!("page must be >= 1, got {}", page)));
        }
        if per_page < 1 {
            return Err(Error::InvalidInput(format!(
                "per_page must be >= 1, got {}",
                per_page
            )));
        }
        Ok(Self { page, per_page })
    }

    /// Offset for SQL LIMIT/OFFSET query
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Pagination metadata returned alongside a page of items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
}

/// Calculate pagination metadata from total results and the request
///
/// # Examples
/// ```
/// use lp_common::pagination::{calculate_pagination, PageRequest};
///
/// // 250 total results at 100 per page = 3 pages (100 + 100 + 50)
/// let p = calculate_pagination(250, PageRequest::new(2, 100).unwrap());
/// assert_eq!(p.current_page, 2);
/// assert_eq!(p.total_pages, 3);
/// ```
pub fn calculate_pagination(total_items: i64, request: PageRequest) -> Pagination {
    let total_pages = total_items.saturating_add(request.per_page - 1) / request.per_page;
    Pagination {
        current_page: request.page,
        total_pages,
        total_items,
        items_per_page: request.per_page,
    }
}

/// One page of items with its metadata
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: i64, request: PageRequest) -> Self {
        Self {
            items,
            pagination: calculate_pagination(total_items, request),
        }
    }
}

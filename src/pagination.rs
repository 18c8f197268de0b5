//! This modules defines the common functionality for paging data.

use serde::{Deserialize, Serialize};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may request.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Describes where a page sits within the full set of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The number of items across all pages.
    pub total: u64,
    /// The number of pages needed to show every item.
    pub total_pages: u64,
    /// The page that was returned, starting from one.
    pub current_page: u64,
    /// Whether there is a page after the current one.
    pub has_next_page: bool,
    /// Whether there is a page before the current one.
    pub has_previous_page: bool,
}

impl Pagination {
    /// Derive the pagination details for `current_page` of `total` items split into pages of `page_size`.
    ///
    /// `page_size` must be greater than zero.
    pub fn new(total: u64, current_page: u64, page_size: u64) -> Self {
        let total_pages = total.div_ceil(page_size);

        Self {
            total,
            total_pages,
            current_page,
            has_next_page: current_page < total_pages,
            has_previous_page: current_page > 1,
        }
    }
}

/// The number of items to skip to reach the start of `page`.
pub fn page_offset(page: u64, page_size: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(page_size)
}

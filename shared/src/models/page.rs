//! Paginated list response

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Upper bound on page size for list endpoints
pub const MAX_PER_PAGE: u32 = 100;

/// One page of a filtered list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    /// Total rows matching the filter (all pages)
    pub total: u64,
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: u32, per_page: u32) -> Self {
        let total_pages = if per_page > 0 {
            total.div_ceil(per_page as u64) as u32
        } else {
            1
        };

        Self {
            data,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// Clamp user-supplied paging to `(page, per_page, offset)`
pub fn normalize_paging(page: Option<u32>, per_page: Option<u32>) -> (u32, u32, u64) {
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let page = page.unwrap_or(1).max(1);
    let offset = (page as u64 - 1) * per_page as u64;
    (page, per_page, offset)
}

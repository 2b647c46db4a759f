//! Pagination state and the page selector window.

use crate::api::types::Pagination;
use serde::Serialize;
use std::ops::RangeInclusive;

/// Widest page selector shown
pub const WINDOW_WIDTH: u32 = 5;

/// Current and last page, always satisfying `1 <= current_page <= last_page`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationInfo {
    current_page: u32,
    last_page: u32,
}

impl Default for PaginationInfo {
    fn default() -> Self {
        Self {
            current_page: 1,
            last_page: 1,
        }
    }
}

impl PaginationInfo {
    /// Clamp whatever the server reported into a valid pair
    pub fn new(current_page: u32, last_page: u32) -> Self {
        let last_page = last_page.max(1);
        Self {
            current_page: current_page.clamp(1, last_page),
            last_page,
        }
    }

    /// Pagination from a response, defaulting to a single page
    pub fn from_response(pagination: Option<&Pagination>) -> Self {
        match pagination {
            Some(p) => Self::new(
                reported_page(p.current_page),
                reported_page(p.last_visible_page),
            ),
            None => Self::default(),
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn last_page(&self) -> u32 {
        self.last_page
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }

    /// Page numbers to offer as selector buttons
    pub fn window(&self) -> RangeInclusive<u32> {
        page_window(self.current_page, self.last_page)
    }
}

/// A page number as the server sent it, squeezed into `[1, u32::MAX]`
fn reported_page(page: Option<i64>) -> u32 {
    page.map_or(1, |p| p.clamp(1, i64::from(u32::MAX)) as u32)
}

/// Contiguous run of at most five page numbers, as centred on `current_page`
/// as the bounds `[1, last_page]` allow
pub fn page_window(current_page: u32, last_page: u32) -> RangeInclusive<u32> {
    let last_page = last_page.max(1);
    let current_page = current_page.clamp(1, last_page);

    let mut start = current_page.saturating_sub(2).max(1);
    let end = last_page.min(start.saturating_add(WINDOW_WIDTH - 1));

    if end - start < WINDOW_WIDTH - 1 {
        start = end.saturating_sub(WINDOW_WIDTH - 1).max(1);
    }

    start..=end
}

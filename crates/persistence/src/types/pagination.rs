//! Pagination types for search results.
//!
//! The registry pages with `LIMIT`/`OFFSET`; an unfiltered search is still
//! bounded by the page size.

use serde::{Deserialize, Serialize};

/// Default number of entries per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One page of a search: how many rows and from where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Maximum number of results to return.
    pub count: usize,
    /// Number of matching rows to skip.
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            count: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl Page {
    /// Creates a page of `count` rows starting after `offset` rows.
    pub fn new(count: usize, offset: usize) -> Self {
        Self { count, offset }
    }

    /// The page after this one.
    pub fn next(&self) -> Self {
        Self {
            count: self.count,
            offset: self.offset.saturating_add(self.count),
        }
    }

    /// The page before this one, `None` on the first page.
    pub fn previous(&self) -> Option<Self> {
        if self.offset == 0 {
            return None;
        }
        Some(Self {
            count: self.count,
            offset: self.offset.saturating_sub(self.count),
        })
    }
}

/// One page of matches plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage<T> {
    /// The rows on this page.
    pub items: Vec<T>,
    /// Number of rows matching the filter, ignoring paging.
    pub total: u64,
    /// The page that was requested.
    pub page: Page,
}

impl<T> SearchPage<T> {
    /// Creates a page of results.
    pub fn new(items: Vec<T>, total: u64, page: Page) -> Self {
        Self { items, total, page }
    }

    /// Returns true if matches remain after this page.
    pub fn has_next(&self) -> bool {
        (self.page.offset.saturating_add(self.items.len()) as u64) < self.total
    }

    /// Maps the items, keeping the paging information.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> SearchPage<U> {
        SearchPage {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
        }
    }
}

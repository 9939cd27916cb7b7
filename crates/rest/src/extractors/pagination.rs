//! Pagination parameters.
//!
//! `_count` and `_offset` arrive mixed in with the search parameters, in the
//! query string for GET and in the form body for POST `_search`, so they are
//! read from the already-collected parameter map.

use std::collections::HashMap;

use smh_persistence::types::Page;

use crate::error::RestError;

/// Largest `_count` or `_offset` accepted; SQLite binds paging values as i64.
const MAX_PAGING_VALUE: usize = i64::MAX as usize;

/// Validated `_count` / `_offset` for one search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page size (number of items to return).
    count: usize,
    /// Offset (number of items to skip).
    offset: usize,
}

impl Pagination {
    /// Creates a new Pagination, capping `count` at `max_count`.
    pub fn new(count: usize, offset: usize, max_count: usize) -> Self {
        Self {
            count: count.min(max_count),
            offset,
        }
    }

    /// Reads `_count` and `_offset` from the request's parameters.
    ///
    /// A missing `_count` falls back to `default_count`; any `_count` is
    /// capped at `max_count`. Values that are not non-negative integers are
    /// rejected.
    pub fn from_params(
        params: &HashMap<String, String>,
        default_count: usize,
        max_count: usize,
    ) -> Result<Self, RestError> {
        let count = parse(params, "_count")?.unwrap_or(default_count);
        let offset = parse(params, "_offset")?.unwrap_or(0);
        Ok(Self::new(count, offset, max_count))
    }

    /// Returns the page size.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The storage page this pagination selects.
    pub fn page(&self) -> Page {
        Page::new(self.count, self.offset)
    }
}

fn parse(params: &HashMap<String, String>, name: &str) -> Result<Option<usize>, RestError> {
    match params.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|value| *value <= MAX_PAGING_VALUE)
            .map(Some)
            .ok_or_else(|| RestError::InvalidSearchParameter {
                parameter: name.to_string(),
                message: format!(
                    "'{}' is not an integer between 0 and {}",
                    raw, MAX_PAGING_VALUE
                ),
            }),
    }
}

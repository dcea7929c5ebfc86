//! Cursor pagination contract

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Request for one page of a collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Opaque cursor returned by the previous page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl PageRequest {
    /// First page with the given size
    pub fn first(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            cursor: None,
        }
    }

    /// Page after `cursor`
    pub fn after(limit: u32, cursor: impl Into<String>) -> Self {
        Self {
            limit: Some(limit),
            cursor: Some(cursor.into()),
        }
    }

    /// Requested page size, falling back to [`DEFAULT_PAGE_SIZE`]
    pub fn page_size(&self) -> u32 {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub has_more: bool,
    /// Cursor for the next page; only set when `has_more`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    pub page_size: u32,
}

impl<T> PaginatedResponse<T> {
    /// Build a page; the cursor is dropped when there is no next page
    pub fn new(data: Vec<T>, next_cursor: Option<String>, page_size: u32) -> Self {
        let cursor = next_cursor.filter(|c| !c.is_empty());
        Self {
            has_more: cursor.is_some(),
            data,
            cursor,
            total_count: None,
            page_size,
        }
    }

    /// Attach a vendor-reported total
    pub fn with_total(mut self, total: u64) -> Self {
        self.total_count = Some(total);
        self
    }

    /// Empty final page
    pub fn empty(page_size: u32) -> Self {
        Self::new(Vec::new(), None, page_size)
    }

    /// Map the records, keeping the cursor contract
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            has_more: self.has_more,
            cursor: self.cursor,
            total_count: self.total_count,
            page_size: self.page_size,
        }
    }
}

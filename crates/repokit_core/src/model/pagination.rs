//! Pagination descriptor and paged result.
//!
//! # Invariants
//! - `page` is 1-based; `page >= 1` and `limit >= 1` are checked by the
//!   repository before any SQL runs.
//! - `max_page == ceil(total / limit)`; zero rows yields `max_page == 0`.

use serde::{Deserialize, Serialize};

/// Per-call page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    /// Maximum rows per page.
    pub limit: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Returns whether both fields satisfy the `>= 1` contract.
    pub fn is_valid(&self) -> bool {
        self.page >= 1 && self.limit >= 1
    }

    /// Rows skipped before this page starts.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Number of pages needed for `total` rows; `0` for an invalid limit.
    pub fn max_page(&self, total: i64) -> i64 {
        if self.limit == 0 || total <= 0 {
            return 0;
        }
        let limit = i64::from(self.limit);
        (total + limit - 1) / limit
    }
}

/// One page of records plus the totals it was cut from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<T> {
    /// Rows on the requested page, at most `limit` of them.
    pub items: Vec<T>,
    /// Rows matching the query before limit/offset.
    pub total: i64,
    /// `ceil(total / limit)`.
    pub max_page: i64,
}

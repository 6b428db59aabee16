use serde::Serialize;

use crate::domain::order::OrderError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// A validated page window (`page` and `limit` are both at least 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Result<Self, OrderError> {
        if page == 0 {
            return Err(OrderError::InvalidPagination("page must be at least 1".into()));
        }
        if limit == 0 {
            return Err(OrderError::InvalidPagination("limit must be at least 1".into()));
        }
        Ok(Self { page, limit })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn meta(&self, total: u64) -> PageMeta {
        PageMeta {
            total,
            current_page: self.page,
            last_page: last_page(total, self.limit),
        }
    }
}

/// `ceil(total / limit)`; zero when there are no rows.
pub fn last_page(total: u64, limit: u32) -> u64 {
    total.div_ceil(u64::from(limit.max(1)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total: u64,
    pub current_page: u32,
    pub last_page: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, meta: PageMeta) -> Self {
        Self { data, meta }
    }
}

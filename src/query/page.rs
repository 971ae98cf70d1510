//! Pagination parameters.

use crate::error::{InventoryError, Result};

const DEFAULT_PAGE: u64 = 0;
const DEFAULT_PAGE_SIZE: u64 = 25;

/// A zero-based page of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }

    /// Parses the `page` and `pageSize` query parameters.
    ///
    /// Absent or blank values fall back to the defaults. Anything that is not a
    /// non-negative integer, a page size of zero, or a page size above
    /// `max_page_size` is an invalid request.
    pub fn from_params(page: Option<&str>, page_size: Option<&str>, max_page_size: u64) -> Result<Self> {
        let page = parse_param("page", page, DEFAULT_PAGE)?;
        let page_size = parse_param("pageSize", page_size, DEFAULT_PAGE_SIZE)?;

        if page_size == 0 {
            return Err(InventoryError::invalid_request("pageSize must be at least 1"));
        }
        if page_size > max_page_size {
            return Err(InventoryError::invalid_request(format!(
                "pageSize must not exceed {max_page_size}"
            )));
        }

        let request = Self { page, page_size };
        request.checked_offset()?;
        Ok(request)
    }

    /// Number of rows to skip: `page * page_size`.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.page_size)
    }

    fn checked_offset(&self) -> Result<u64> {
        self.page
            .checked_mul(self.page_size)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| InventoryError::invalid_request("page is out of range"))
    }
}

fn parse_param(name: &str, raw: Option<&str>, default: u64) -> Result<u64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse::<u64>().map_err(|_| {
            InventoryError::invalid_request(format!(
                "{name} must be a non-negative integer, got '{value}'"
            ))
        }),
    }
}

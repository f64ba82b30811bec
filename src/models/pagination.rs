//! Offset-based pagination

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::book::Book;
use crate::error::{AppError, AppResult, FieldViolation};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, starting at 1 (default: 1)
    pub page: Option<i64>,
    /// Books per page, 1-100 (default: 10)
    pub page_size: Option<i64>,
}

/// A checked page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    /// Check bounds; out-of-range values are rejected, never clamped
    pub fn new(page: i64, page_size: i64) -> AppResult<Self> {
        let mut violations = Vec::new();
        if page < 1 {
            violations.push(FieldViolation {
                field: "page".to_string(),
                message: "must be greater than or equal to 1".to_string(),
            });
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            violations.push(FieldViolation {
                field: "page_size".to_string(),
                message: format!("must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }
        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }

        // offset must be representable for the store
        if (page - 1).checked_mul(page_size).is_none() {
            return Err(AppError::Validation(vec![FieldViolation {
                field: "page".to_string(),
                message: "is too large".to_string(),
            }]));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// `ceil(total / page_size)` in integer arithmetic
    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.page_size - 1) / self.page_size
    }
}

impl TryFrom<PageQuery> for PageRequest {
    type Error = AppError;

    fn try_from(query: PageQuery) -> AppResult<Self> {
        PageRequest::new(
            query.page.unwrap_or(DEFAULT_PAGE),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

/// One page of books
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookPage {
    /// Books on this page, ordered by id
    pub books: Vec<Book>,
    /// Total number of books stored
    #[schema(example = 25)]
    pub total: i64,
    #[schema(example = 1)]
    pub page: i64,
    #[schema(example = 10)]
    pub page_size: i64,
    #[schema(example = 3)]
    pub total_pages: i64,
}

impl BookPage {
    pub fn new(books: Vec<Book>, total: i64, request: PageRequest) -> Self {
        Self {
            books,
            total,
            page: request.page(),
            page_size: request.page_size(),
            total_pages: request.total_pages(total),
        }
    }
}

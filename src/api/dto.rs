//! Shared Data Transfer Objects (DTOs) for API handlers.

use serde::Serialize;
use utoipa::ToSchema;

/// Pagination metadata for list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
    /// Total number of items across all pages
    pub total: i64,
    /// Total number of pages
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, per_page: u32, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            ((total as f64) / (f64::from(per_page))).ceil() as u32
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        let p = Pagination::new(1, 20, 41);
        assert_eq!(p.total_pages, 3);
    }

    #[test]
    fn test_empty_list_has_zero_pages() {
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 0);
    }
}

//! Request types for the shared crate

use serde::{Deserialize, Serialize};

/// Smallest page size handed out when the client asks for zero or less
pub const DEFAULT_PAGE_SIZE: u32 = 12;
/// Largest page size a client may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// One line of a create-order request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderItem {
    pub book_id: i64,
    pub quantity: i32,
    /// Unit price in minor currency units
    pub price: i64,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<CreateOrderItem>,
}

/// Pagination query parameters
///
/// Accepts any integers; [`PaginationQuery::normalize`] clamps them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PaginationQuery {
    /// Page number (1-based)
    #[serde(default)]
    pub page: Option<i64>,

    /// Items per page
    #[serde(default)]
    pub page_size: Option<i64>,
}

impl PaginationQuery {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// Clamp to `(page, per_page)`: page < 1 becomes 1, size <= 0 becomes
    /// [`DEFAULT_PAGE_SIZE`], size above [`MAX_PAGE_SIZE`] is capped.
    pub fn normalize(&self) -> (u32, u32) {
        let page = match self.page {
            Some(p) if p >= 1 => p.min(u32::MAX as i64) as u32,
            _ => 1,
        };
        let per_page = match self.page_size {
            Some(s) if s > MAX_PAGE_SIZE as i64 => MAX_PAGE_SIZE,
            Some(s) if s > 0 => s as u32,
            _ => DEFAULT_PAGE_SIZE,
        };
        (page, per_page)
    }

    /// Row offset for a normalized `(page, per_page)`
    pub fn offset(page: u32, per_page: u32) -> u64 {
        (page.saturating_sub(1)) as u64 * per_page as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_defaults() {
        assert_eq!(PaginationQuery::default().normalize(), (1, 12));
    }

    #[test]
    fn test_normalize_clamps() {
        assert_eq!(PaginationQuery::new(0, 0).normalize(), (1, 12));
        assert_eq!(PaginationQuery::new(-3, -1).normalize(), (1, 12));
        assert_eq!(PaginationQuery::new(2, 500).normalize(), (2, 100));
        assert_eq!(PaginationQuery::new(3, 100).normalize(), (3, 100));
        assert_eq!(PaginationQuery::new(1, 5).normalize(), (1, 5));
    }

    #[test]
    fn test_offset() {
        assert_eq!(PaginationQuery::offset(1, 12), 0);
        assert_eq!(PaginationQuery::offset(3, 10), 20);
    }

    #[test]
    fn test_deserialize_partial_query() {
        let q: PaginationQuery = serde_json::from_str(r#"{"page": 4}"#).unwrap();
        assert_eq!(q.normalize(), (4, 12));
    }
}

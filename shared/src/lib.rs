//! Shared types for the bookstore backend
//!
//! Common types used by the server and its clients: error codes and the
//! response envelope, domain models, pagination and request DTOs.

pub mod error;
pub mod models;
pub mod request;
pub mod response;
pub mod util;

pub use error::{ApiResponse, AppError, ErrorCode};
pub use response::{PaginatedResponse, Pagination};

#[cfg(test)]
mod tests {
    use crate::{ApiResponse, AppError, ErrorCode, PaginatedResponse};

    #[test]
    fn test_root_exports_build_envelopes() {
        let page = PaginatedResponse::new(vec![1, 2], 1, 2, 5);
        assert_eq!(page.pagination.total_pages, 3);

        let response = ApiResponse::success(page);
        assert_eq!(response.code, Some(0));

        let err = AppError::new(ErrorCode::OrderEmpty);
        assert_eq!(ApiResponse::<()>::error(&err).code, Some(4007));
    }
}

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::storage::StorageError;

/// Order workflow errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order has no items")]
    EmptyOrder,

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Book not found: {0}")]
    BookNotFound(i64),

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Book is not on sale: {0}")]
    BookInactive(i64),

    #[error("Insufficient stock for book: {0}")]
    InsufficientStock(i64),

    #[error("Order already paid: {0}")]
    AlreadyPaid(i64),

    #[error("Payment transaction timed out")]
    Timeout,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyOrder => AppError::new(ErrorCode::OrderEmpty),
            OrderError::InvalidItem(msg) => AppError::validation(msg),
            OrderError::BookNotFound(id) => {
                AppError::new(ErrorCode::BookNotFound).with_detail("book_id", id)
            }
            OrderError::OrderNotFound(id) => {
                AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id)
            }
            OrderError::BookInactive(id) => {
                AppError::new(ErrorCode::BookInactive).with_detail("book_id", id)
            }
            OrderError::InsufficientStock(id) => {
                AppError::new(ErrorCode::BookOutOfStock).with_detail("book_id", id)
            }
            OrderError::AlreadyPaid(id) => {
                AppError::new(ErrorCode::OrderAlreadyPaid).with_detail("order_id", id)
            }
            OrderError::Timeout => AppError::new(ErrorCode::TimeoutError),
            OrderError::Storage(e) => {
                // Details stay in the log
                tracing::error!(error = %e, "Order storage error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_error_mapping() {
        let cases = [
            (OrderError::EmptyOrder, ErrorCode::OrderEmpty, StatusCode::BAD_REQUEST),
            (
                OrderError::InvalidItem("quantity must be positive".into()),
                ErrorCode::ValidationFailed,
                StatusCode::BAD_REQUEST,
            ),
            (OrderError::BookNotFound(1), ErrorCode::BookNotFound, StatusCode::NOT_FOUND),
            (OrderError::OrderNotFound(1), ErrorCode::OrderNotFound, StatusCode::NOT_FOUND),
            (OrderError::BookInactive(1), ErrorCode::BookInactive, StatusCode::BAD_REQUEST),
            (OrderError::InsufficientStock(1), ErrorCode::BookOutOfStock, StatusCode::CONFLICT),
            (OrderError::AlreadyPaid(1), ErrorCode::OrderAlreadyPaid, StatusCode::CONFLICT),
            (OrderError::Timeout, ErrorCode::TimeoutError, StatusCode::SERVICE_UNAVAILABLE),
            (
                OrderError::Storage(StorageError::BackendMismatch),
                ErrorCode::DatabaseError,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, code, status) in cases {
            let app: AppError = err.into();
            assert_eq!(app.code, code);
            assert_eq!(app.http_status(), status);
        }
    }

    #[test]
    fn test_storage_details_not_exposed() {
        let app: AppError =
            OrderError::Storage(StorageError::Constraint("duplicate order_no ORD1".into())).into();
        assert!(!app.message.contains("ORD1"));
        assert!(app.details.is_none());
    }
}

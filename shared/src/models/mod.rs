//! Data models
//!
//! Shared between bookstore-server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64`, money is `i64` minor units, timestamps are UTC millis.

pub mod book;
pub mod order;

// Re-exports
pub use book::*;
pub use order::*;

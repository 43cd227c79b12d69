//! Order creation and payment
//!
//! - **service**: [`OrderService`], the workflow over the storage traits
//! - **order_no**: per-process order number generator
//! - **error**: [`OrderError`] and its mapping to API errors
//!
//! # Payment
//!
//! ```text
//! begin → lock order (+items) → already paid? → decrement stock per item
//!       → mark paid → commit
//! ```
//!
//! Any failure drops the transaction uncommitted, so either every decrement
//! and the pay-mark land together or none of them do.

pub mod error;
pub mod order_no;
pub mod service;

#[cfg(test)]
mod tests;

pub use error::{OrderError, OrderResult};
pub use order_no::OrderNoGenerator;
pub use service::{DEFAULT_PAY_TIMEOUT, MAX_ITEM_QUANTITY, OrderService};

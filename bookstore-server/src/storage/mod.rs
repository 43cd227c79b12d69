//! Storage seam for the order flow
//!
//! The workflow talks to storage only through the traits below, so the same
//! code runs against PostgreSQL ([`crate::db::PgStorage`]) and the embedded
//! redb store ([`crate::embedded::EmbeddedStorage`]). [`Storage`] picks one
//! at startup.
//!
//! Transactions are explicit: `begin` hands out a transaction, the
//! transaction-bound operations borrow it mutably, and `commit` consumes it.
//! Dropping a transaction without committing rolls it back.

mod dispatch;
mod error;

pub use dispatch::{Storage, StorageTx};
pub use error::{StorageError, StorageResult};

use async_trait::async_trait;
use shared::models::{Book, BookUpsert, Order, OrderCreate, OrderStatistics};

/// Explicit transaction boundary
#[async_trait]
pub trait Transactional: Send + Sync {
    type Tx: Send;

    async fn begin(&self) -> StorageResult<Self::Tx>;

    /// Make the transaction durable.
    ///
    /// Not cancel-safe: a backend may finish the commit after this future is
    /// dropped, so callers must not race it against a deadline.
    async fn commit(&self, tx: Self::Tx) -> StorageResult<()>;
}

/// Per-book stock and sale counters
#[async_trait]
pub trait InventoryLedger: Transactional {
    /// Unfiltered read, ignores the sale status
    async fn get_for_admin(&self, book_id: i64) -> StorageResult<Option<Book>>;

    /// `stock -= quantity, sale += quantity` only where `stock >= quantity`.
    ///
    /// Returns `false` when nothing was updated (missing book or not enough
    /// stock).
    async fn decrease_stock_and_record_sale(
        &self,
        tx: &mut Self::Tx,
        book_id: i64,
        quantity: i32,
    ) -> StorageResult<bool>;

    /// Catalog upsert used for seeding and administration, outside the order flow
    async fn upsert_book(&self, book: BookUpsert) -> StorageResult<Book>;
}

/// Order and order item persistence
#[async_trait]
pub trait OrderStore: Transactional {
    /// Exclusive lock on the order row; items are loaded without a lock
    async fn lock_order_with_items(
        &self,
        tx: &mut Self::Tx,
        order_id: i64,
    ) -> StorageResult<Option<Order>>;

    /// Mark paid only if currently unpaid. Returns the affected row count.
    async fn mark_paid(&self, tx: &mut Self::Tx, order_id: i64, paid_at: i64)
    -> StorageResult<u64>;

    /// Insert the order and all of its items atomically
    async fn create_with_items(&self, order: OrderCreate) -> StorageResult<Order>;

    async fn get_order_by_id(&self, order_id: i64) -> StorageResult<Option<Order>>;

    /// One page of a user's orders (newest first) plus the user's total order count
    async fn list_user_orders(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> StorageResult<(Vec<Order>, u64)>;
}

/// Read-only aggregates
#[async_trait]
pub trait StatisticsReader: Send + Sync {
    async fn order_statistics(&self, user_id: i64) -> StorageResult<OrderStatistics>;
}

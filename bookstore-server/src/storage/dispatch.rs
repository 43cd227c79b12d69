//! Backend selected at startup

use async_trait::async_trait;
use redb::WriteTransaction;
use shared::models::{Book, BookUpsert, Order, OrderCreate, OrderStatistics};
use sqlx::{Postgres, Transaction};

use super::{
    InventoryLedger, OrderStore, StatisticsReader, StorageError, StorageResult, Transactional,
};
use crate::db::PgStorage;
use crate::embedded::EmbeddedStorage;

/// Configured storage backend
#[derive(Clone)]
pub enum Storage {
    Postgres(PgStorage),
    Embedded(EmbeddedStorage),
}

/// Transaction of whichever backend opened it
pub enum StorageTx {
    Postgres(Transaction<'static, Postgres>),
    Embedded(WriteTransaction),
}

impl Storage {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Storage::Postgres(_) => "postgres",
            Storage::Embedded(_) => "embedded",
        }
    }
}

impl From<PgStorage> for Storage {
    fn from(storage: PgStorage) -> Self {
        Storage::Postgres(storage)
    }
}

impl From<EmbeddedStorage> for Storage {
    fn from(storage: EmbeddedStorage) -> Self {
        Storage::Embedded(storage)
    }
}

#[async_trait]
impl Transactional for Storage {
    type Tx = StorageTx;

    async fn begin(&self) -> StorageResult<StorageTx> {
        match self {
            Storage::Postgres(s) => Ok(StorageTx::Postgres(s.begin().await?)),
            Storage::Embedded(s) => Ok(StorageTx::Embedded(s.begin().await?)),
        }
    }

    async fn commit(&self, tx: StorageTx) -> StorageResult<()> {
        match (self, tx) {
            (Storage::Postgres(s), StorageTx::Postgres(tx)) => s.commit(tx).await,
            (Storage::Embedded(s), StorageTx::Embedded(tx)) => s.commit(tx).await,
            _ => Err(StorageError::BackendMismatch),
        }
    }
}

#[async_trait]
impl InventoryLedger for Storage {
    async fn get_for_admin(&self, book_id: i64) -> StorageResult<Option<Book>> {
        match self {
            Storage::Postgres(s) => s.get_for_admin(book_id).await,
            Storage::Embedded(s) => s.get_for_admin(book_id).await,
        }
    }

    async fn decrease_stock_and_record_sale(
        &self,
        tx: &mut StorageTx,
        book_id: i64,
        quantity: i32,
    ) -> StorageResult<bool> {
        match (self, tx) {
            (Storage::Postgres(s), StorageTx::Postgres(tx)) => {
                s.decrease_stock_and_record_sale(tx, book_id, quantity).await
            }
            (Storage::Embedded(s), StorageTx::Embedded(tx)) => {
                s.decrease_stock_and_record_sale(tx, book_id, quantity).await
            }
            _ => Err(StorageError::BackendMismatch),
        }
    }

    async fn upsert_book(&self, book: BookUpsert) -> StorageResult<Book> {
        match self {
            Storage::Postgres(s) => s.upsert_book(book).await,
            Storage::Embedded(s) => s.upsert_book(book).await,
        }
    }
}

#[async_trait]
impl OrderStore for Storage {
    async fn lock_order_with_items(
        &self,
        tx: &mut StorageTx,
        order_id: i64,
    ) -> StorageResult<Option<Order>> {
        match (self, tx) {
            (Storage::Postgres(s), StorageTx::Postgres(tx)) => {
                s.lock_order_with_items(tx, order_id).await
            }
            (Storage::Embedded(s), StorageTx::Embedded(tx)) => {
                s.lock_order_with_items(tx, order_id).await
            }
            _ => Err(StorageError::BackendMismatch),
        }
    }

    async fn mark_paid(
        &self,
        tx: &mut StorageTx,
        order_id: i64,
        paid_at: i64,
    ) -> StorageResult<u64> {
        match (self, tx) {
            (Storage::Postgres(s), StorageTx::Postgres(tx)) => {
                s.mark_paid(tx, order_id, paid_at).await
            }
            (Storage::Embedded(s), StorageTx::Embedded(tx)) => {
                s.mark_paid(tx, order_id, paid_at).await
            }
            _ => Err(StorageError::BackendMismatch),
        }
    }

    async fn create_with_items(&self, order: OrderCreate) -> StorageResult<Order> {
        match self {
            Storage::Postgres(s) => s.create_with_items(order).await,
            Storage::Embedded(s) => s.create_with_items(order).await,
        }
    }

    async fn get_order_by_id(&self, order_id: i64) -> StorageResult<Option<Order>> {
        match self {
            Storage::Postgres(s) => s.get_order_by_id(order_id).await,
            Storage::Embedded(s) => s.get_order_by_id(order_id).await,
        }
    }

    async fn list_user_orders(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> StorageResult<(Vec<Order>, u64)> {
        match self {
            Storage::Postgres(s) => s.list_user_orders(user_id, page, per_page).await,
            Storage::Embedded(s) => s.list_user_orders(user_id, page, per_page).await,
        }
    }
}

#[async_trait]
impl StatisticsReader for Storage {
    async fn order_statistics(&self, user_id: i64) -> StorageResult<OrderStatistics> {
        match self {
            Storage::Postgres(s) => s.order_statistics(user_id).await,
            Storage::Embedded(s) => s.order_statistics(user_id).await,
        }
    }
}

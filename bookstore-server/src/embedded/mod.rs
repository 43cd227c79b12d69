//! redb-based storage backend (standalone mode and tests)
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `books` | `book_id` | `Book` | Catalog rows with stock and sale counters |
//! | `orders` | `order_id` | `Order` | Order rows (items stored separately) |
//! | `order_items` | `(order_id, item_id)` | `OrderItem` | Order lines |
//! | `user_orders` | `(user_id, order_id)` | `()` | Per-user index, ordered by id |
//! | `order_numbers` | `order_no` | `order_id` | Unique order number index |
//! | `sequence_counter` | name | `i64` | Id generators |
//!
//! # Locking
//!
//! redb admits a single write transaction at a time, so every transaction
//! handed out by [`EmbeddedStorage::begin`] already excludes every other
//! writer. The predicates of the ledger decrement and the pay-mark are still
//! evaluated inside the transaction. Readers see the last committed snapshot
//! and never block.
//!
//! Only `begin` and `commit` run on the blocking pool. The operations that
//! take a `&mut WriteTransaction` run inline on the calling async worker and
//! can block it on page I/O when the database is file-backed. A `commit`
//! handed to the blocking pool completes even if its caller is dropped.

mod ledger;
mod orders;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{Order, OrderItem};
use std::path::Path;
use std::sync::Arc;

use crate::storage::{StorageResult, Transactional};

/// Books: key = book_id, value = JSON-serialized Book
const BOOKS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("books");

/// Orders: key = order_id, value = JSON-serialized Order without items
const ORDERS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("orders");

/// Order items: key = (order_id, item_id), value = JSON-serialized OrderItem
const ORDER_ITEMS_TABLE: TableDefinition<(i64, i64), &[u8]> = TableDefinition::new("order_items");

/// Per-user order index: key = (user_id, order_id), value = empty
const USER_ORDERS_TABLE: TableDefinition<(i64, i64), ()> = TableDefinition::new("user_orders");

/// Unique order numbers: key = order_no, value = order_id
const ORDER_NUMBERS_TABLE: TableDefinition<&str, i64> = TableDefinition::new("order_numbers");

/// Id generators: key = sequence name, value = last issued id
const SEQUENCE_TABLE: TableDefinition<&str, i64> = TableDefinition::new("sequence_counter");

const ORDER_ID_SEQ: &str = "order_id";
const ORDER_ITEM_ID_SEQ: &str = "order_item_id";

/// Embedded storage backed by redb
#[derive(Clone)]
pub struct EmbeddedStorage {
    db: Arc<Database>,
}

impl EmbeddedStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns the data is on disk, and the file is always consistent.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(BOOKS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_ITEMS_TABLE)?;
            let _ = write_txn.open_table(USER_ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_NUMBERS_TABLE)?;
            let _ = write_txn.open_table(SEQUENCE_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Run a closure on the blocking pool with a handle to the database
    async fn blocking<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> StorageResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }
}

#[async_trait]
impl Transactional for EmbeddedStorage {
    type Tx = WriteTransaction;

    /// Waits for the single writer slot on the blocking pool
    async fn begin(&self) -> StorageResult<WriteTransaction> {
        self.blocking(|db| Ok(db.begin_write()?)).await
    }

    async fn commit(&self, tx: WriteTransaction) -> StorageResult<()> {
        tokio::task::spawn_blocking(move || tx.commit()).await??;
        Ok(())
    }
}

// ========== Helpers ==========

fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Take the next id from a named sequence
fn next_id(txn: &WriteTransaction, name: &str) -> StorageResult<i64> {
    let mut table = txn.open_table(SEQUENCE_TABLE)?;
    let current = table.get(name)?.map(|guard| guard.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(name, next)?;
    Ok(next)
}

fn read_order(
    table: &impl ReadableTable<i64, &'static [u8]>,
    order_id: i64,
) -> StorageResult<Option<Order>> {
    match table.get(order_id)? {
        Some(guard) => Ok(Some(decode(guard.value())?)),
        None => Ok(None),
    }
}

fn read_items(
    table: &impl ReadableTable<(i64, i64), &'static [u8]>,
    order_id: i64,
) -> StorageResult<Vec<OrderItem>> {
    let mut items = Vec::new();
    for result in table.range((order_id, i64::MIN)..=(order_id, i64::MAX))? {
        let (_, value) = result?;
        items.push(decode(value.value())?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_backed_storage_persists_across_reopen() {
        use crate::storage::{InventoryLedger, OrderStore};
        use shared::models::{BookUpsert, OrderCreate, OrderItemCreate};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookstore.redb");

        let order_id = {
            let storage = EmbeddedStorage::open(&path).unwrap();
            storage
                .upsert_book(BookUpsert {
                    id: 1,
                    title: "Dune".into(),
                    author: "Frank Herbert".into(),
                    price: 1000,
                    stock: 3,
                    sale: 0,
                    status: Default::default(),
                })
                .await
                .unwrap();
            let order = storage
                .create_with_items(OrderCreate {
                    user_id: 9,
                    order_no: "ORD1".into(),
                    total_amount: 1000,
                    created_at: 1,
                    items: vec![OrderItemCreate {
                        book_id: 1,
                        quantity: 1,
                        price: 1000,
                        subtotal: 1000,
                    }],
                })
                .await
                .unwrap();
            order.id
        };

        let storage = EmbeddedStorage::open(&path).unwrap();
        let order = storage.get_order_by_id(order_id).await.unwrap().unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(storage.get_for_admin(1).await.unwrap().unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_uncommitted_transaction_rolls_back() {
        use crate::storage::InventoryLedger;
        use shared::models::BookUpsert;

        let storage = EmbeddedStorage::open_in_memory().unwrap();
        storage
            .upsert_book(BookUpsert {
                id: 1,
                title: "Emma".into(),
                author: "Jane Austen".into(),
                price: 500,
                stock: 4,
                sale: 0,
                status: Default::default(),
            })
            .await
            .unwrap();

        let mut tx = storage.begin().await.unwrap();
        assert!(
            storage
                .decrease_stock_and_record_sale(&mut tx, 1, 4)
                .await
                .unwrap()
        );
        drop(tx);

        let book = storage.get_for_admin(1).await.unwrap().unwrap();
        assert_eq!(book.stock, 4);
        assert_eq!(book.sale, 0);
    }

    #[tokio::test]
    async fn test_commit_finishes_after_caller_is_dropped() {
        use crate::storage::InventoryLedger;
        use shared::models::BookUpsert;
        use std::time::Duration;

        let storage = EmbeddedStorage::open_in_memory().unwrap();
        storage
            .upsert_book(BookUpsert {
                id: 1,
                title: "Emma".into(),
                author: "Jane Austen".into(),
                price: 500,
                stock: 4,
                sale: 0,
                status: Default::default(),
            })
            .await
            .unwrap();

        let mut tx = storage.begin().await.unwrap();
        assert!(
            storage
                .decrease_stock_and_record_sale(&mut tx, 1, 4)
                .await
                .unwrap()
        );

        // The first poll hands the commit to the blocking pool, then the deadline drops it
        let _ = tokio::time::timeout(Duration::ZERO, storage.commit(tx)).await;

        let mut stock = None;
        for _ in 0..100 {
            stock = Some(storage.get_for_admin(1).await.unwrap().unwrap().stock);
            if stock == Some(0) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(stock, Some(0));
    }
}

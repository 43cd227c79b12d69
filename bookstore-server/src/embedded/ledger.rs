//! Inventory ledger on redb

use async_trait::async_trait;
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use shared::models::{Book, BookUpsert};
use shared::util::now_millis;

use super::{BOOKS_TABLE, EmbeddedStorage, decode, encode};
use crate::storage::{InventoryLedger, StorageError, StorageResult};

#[async_trait]
impl InventoryLedger for EmbeddedStorage {
    async fn get_for_admin(&self, book_id: i64) -> StorageResult<Option<Book>> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(BOOKS_TABLE)?;
            match table.get(book_id)? {
                Some(guard) => Ok(Some(decode(guard.value())?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn decrease_stock_and_record_sale(
        &self,
        tx: &mut WriteTransaction,
        book_id: i64,
        quantity: i32,
    ) -> StorageResult<bool> {
        let mut table = tx.open_table(BOOKS_TABLE)?;
        let mut book: Book = match table.get(book_id)? {
            Some(guard) => decode(guard.value())?,
            None => return Ok(false),
        };
        if book.stock < quantity {
            return Ok(false);
        }

        book.stock -= quantity;
        book.sale = book.sale.saturating_add(i64::from(quantity));
        book.updated_at = now_millis();
        table.insert(book_id, encode(&book)?.as_slice())?;
        Ok(true)
    }

    async fn upsert_book(&self, upsert: BookUpsert) -> StorageResult<Book> {
        if upsert.stock < 0 {
            return Err(StorageError::Constraint(format!(
                "book {} stock must not be negative",
                upsert.id
            )));
        }

        self.blocking(move |db| {
            let txn = db.begin_write()?;
            let book = {
                let mut table = txn.open_table(BOOKS_TABLE)?;
                let now = now_millis();
                let created_at = match table.get(upsert.id)? {
                    Some(guard) => decode::<Book>(guard.value())?.created_at,
                    None => now,
                };
                let book = Book {
                    id: upsert.id,
                    title: upsert.title,
                    author: upsert.author,
                    price: upsert.price,
                    stock: upsert.stock,
                    sale: upsert.sale,
                    status: upsert.status,
                    created_at,
                    updated_at: now,
                };
                table.insert(book.id, encode(&book)?.as_slice())?;
                book
            };
            txn.commit()?;
            Ok(book)
        })
        .await
    }
}

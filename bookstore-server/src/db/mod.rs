//! PostgreSQL storage backend
//!
//! Free functions per table live in the submodules; [`PgStorage`] wires them
//! to the storage traits.

pub mod books;
pub mod orders;
pub mod statistics;

use async_trait::async_trait;
use shared::models::{Book, BookUpsert, Order, OrderCreate, OrderStatistics};
use shared::request::PaginationQuery;
use shared::util::now_millis;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use crate::storage::{
    InventoryLedger, OrderStore, StatisticsReader, StorageError, StorageResult, Transactional,
};

/// PostgreSQL storage
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
    /// Applied as `lock_timeout` and `statement_timeout` on every transaction (0 = unset)
    tx_timeout_ms: u64,
}

impl PgStorage {
    /// Connect, then apply pending migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let storage = Self::from_pool(pool);
        storage.migrate().await?;
        Ok(storage)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            tx_timeout_ms: 0,
        }
    }

    pub fn with_tx_timeout_ms(mut self, tx_timeout_ms: u64) -> Self {
        self.tx_timeout_ms = tx_timeout_ms;
        self
    }

    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Unique and check violations surface as constraint errors
fn map_constraint(err: sqlx::Error) -> StorageError {
    if let Some(db_err) = err.as_database_error()
        && (db_err.is_unique_violation() || db_err.is_check_violation())
    {
        return StorageError::Constraint(db_err.message().to_string());
    }
    StorageError::Postgres(err)
}

#[async_trait]
impl Transactional for PgStorage {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> StorageResult<Self::Tx> {
        let mut tx = self.pool.begin().await?;
        if self.tx_timeout_ms > 0 {
            // Integer values are milliseconds
            sqlx::query(&format!("SET LOCAL lock_timeout = {}", self.tx_timeout_ms))
                .execute(&mut *tx)
                .await?;
            sqlx::query(&format!(
                "SET LOCAL statement_timeout = {}",
                self.tx_timeout_ms
            ))
            .execute(&mut *tx)
            .await?;
        }
        Ok(tx)
    }

    async fn commit(&self, tx: Self::Tx) -> StorageResult<()> {
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl InventoryLedger for PgStorage {
    async fn get_for_admin(&self, book_id: i64) -> StorageResult<Option<Book>> {
        Ok(books::get_for_admin(&self.pool, book_id).await?)
    }

    async fn decrease_stock_and_record_sale(
        &self,
        tx: &mut Self::Tx,
        book_id: i64,
        quantity: i32,
    ) -> StorageResult<bool> {
        Ok(books::decrease_stock_and_record_sale(&mut **tx, book_id, quantity, now_millis()).await?)
    }

    async fn upsert_book(&self, book: BookUpsert) -> StorageResult<Book> {
        books::upsert(&self.pool, &book, now_millis())
            .await
            .map_err(map_constraint)
    }
}

#[async_trait]
impl OrderStore for PgStorage {
    async fn lock_order_with_items(
        &self,
        tx: &mut Self::Tx,
        order_id: i64,
    ) -> StorageResult<Option<Order>> {
        Ok(orders::lock_order_with_items(&mut **tx, order_id).await?)
    }

    async fn mark_paid(
        &self,
        tx: &mut Self::Tx,
        order_id: i64,
        paid_at: i64,
    ) -> StorageResult<u64> {
        Ok(orders::mark_paid(&mut **tx, order_id, paid_at).await?)
    }

    async fn create_with_items(&self, order: OrderCreate) -> StorageResult<Order> {
        orders::create_with_items(&self.pool, &order)
            .await
            .map_err(map_constraint)
    }

    async fn get_order_by_id(&self, order_id: i64) -> StorageResult<Option<Order>> {
        Ok(orders::get_by_id(&self.pool, order_id).await?)
    }

    async fn list_user_orders(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> StorageResult<(Vec<Order>, u64)> {
        let offset = PaginationQuery::offset(page, per_page) as i64;
        Ok(orders::list_by_user(&self.pool, user_id, per_page as i64, offset).await?)
    }
}

#[async_trait]
impl StatisticsReader for PgStorage {
    async fn order_statistics(&self, user_id: i64) -> StorageResult<OrderStatistics> {
        Ok(statistics::order_statistics(&self.pool, user_id).await?)
    }
}

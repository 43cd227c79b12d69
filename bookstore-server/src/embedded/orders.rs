//! Order store and statistics on redb

use async_trait::async_trait;
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use shared::models::{Order, OrderCreate, OrderItem, OrderStatistics, OrderStatus};
use shared::request::PaginationQuery;

use super::{
    EmbeddedStorage, ORDER_ID_SEQ, ORDER_ITEM_ID_SEQ, ORDER_ITEMS_TABLE, ORDER_NUMBERS_TABLE,
    ORDERS_TABLE, USER_ORDERS_TABLE, encode, next_id, read_items, read_order,
};
use crate::storage::{OrderStore, StatisticsReader, StorageError, StorageResult};

#[async_trait]
impl OrderStore for EmbeddedStorage {
    async fn lock_order_with_items(
        &self,
        tx: &mut WriteTransaction,
        order_id: i64,
    ) -> StorageResult<Option<Order>> {
        // The write transaction itself is the lock
        let orders = tx.open_table(ORDERS_TABLE)?;
        let Some(mut order) = read_order(&orders, order_id)? else {
            return Ok(None);
        };
        let items = tx.open_table(ORDER_ITEMS_TABLE)?;
        order.items = read_items(&items, order_id)?;
        Ok(Some(order))
    }

    async fn mark_paid(
        &self,
        tx: &mut WriteTransaction,
        order_id: i64,
        paid_at: i64,
    ) -> StorageResult<u64> {
        let mut orders = tx.open_table(ORDERS_TABLE)?;
        let Some(mut order) = read_order(&orders, order_id)? else {
            return Ok(0);
        };
        if order.is_paid {
            tracing::debug!(order_id, "Order already marked paid, nothing to update");
            return Ok(0);
        }

        order.status = OrderStatus::Paid;
        order.is_paid = true;
        order.payment_time = Some(paid_at);
        order.updated_at = paid_at;
        orders.insert(order_id, encode(&order)?.as_slice())?;
        Ok(1)
    }

    async fn create_with_items(&self, new_order: OrderCreate) -> StorageResult<Order> {
        self.blocking(move |db| {
            let txn = db.begin_write()?;
            let order = insert_order(&txn, new_order)?;
            txn.commit()?;
            Ok(order)
        })
        .await
    }

    async fn get_order_by_id(&self, order_id: i64) -> StorageResult<Option<Order>> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let orders = read_txn.open_table(ORDERS_TABLE)?;
            let Some(mut order) = read_order(&orders, order_id)? else {
                return Ok(None);
            };
            let items = read_txn.open_table(ORDER_ITEMS_TABLE)?;
            order.items = read_items(&items, order_id)?;
            Ok(Some(order))
        })
        .await
    }

    async fn list_user_orders(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> StorageResult<(Vec<Order>, u64)> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let index = read_txn.open_table(USER_ORDERS_TABLE)?;
            let orders = read_txn.open_table(ORDERS_TABLE)?;
            let items = read_txn.open_table(ORDER_ITEMS_TABLE)?;

            let range = (user_id, i64::MIN)..=(user_id, i64::MAX);
            let total = index.range(range.clone())?.count() as u64;

            let offset = PaginationQuery::offset(page, per_page) as usize;
            let mut page_orders = Vec::with_capacity(per_page as usize);
            for result in index
                .range(range)?
                .rev()
                .skip(offset)
                .take(per_page as usize)
            {
                let (key, _) = result?;
                let (_, order_id) = key.value();
                let Some(mut order) = read_order(&orders, order_id)? else {
                    continue;
                };
                order.items = read_items(&items, order_id)?;
                page_orders.push(order);
            }

            Ok((page_orders, total))
        })
        .await
    }
}

#[async_trait]
impl StatisticsReader for EmbeddedStorage {
    async fn order_statistics(&self, user_id: i64) -> StorageResult<OrderStatistics> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let index = read_txn.open_table(USER_ORDERS_TABLE)?;
            let orders = read_txn.open_table(ORDERS_TABLE)?;

            let mut stats = OrderStatistics::default();
            for result in index.range((user_id, i64::MIN)..=(user_id, i64::MAX))? {
                let (key, _) = result?;
                let (_, order_id) = key.value();
                let Some(order) = read_order(&orders, order_id)? else {
                    continue;
                };
                stats.total_orders += 1;
                stats.total_amount = stats
                    .total_amount
                    .checked_add(order.total_amount)
                    .ok_or_else(|| {
                        StorageError::Overflow(format!("total amount of user {user_id}"))
                    })?;
                if order.is_paid {
                    stats.paid_orders += 1;
                }
            }
            stats.pending_orders = stats.total_orders - stats.paid_orders;
            Ok(stats)
        })
        .await
    }
}

/// Insert an order, its items and its index entries inside `txn`
fn insert_order(txn: &WriteTransaction, new_order: OrderCreate) -> StorageResult<Order> {
    {
        let numbers = txn.open_table(ORDER_NUMBERS_TABLE)?;
        if numbers.get(new_order.order_no.as_str())?.is_some() {
            return Err(StorageError::Constraint(format!(
                "duplicate order_no {}",
                new_order.order_no
            )));
        }
    }

    let order_id = next_id(txn, ORDER_ID_SEQ)?;
    let mut items = Vec::with_capacity(new_order.items.len());
    for item in &new_order.items {
        items.push(OrderItem {
            id: next_id(txn, ORDER_ITEM_ID_SEQ)?,
            order_id,
            book_id: item.book_id,
            quantity: item.quantity,
            price: item.price,
            subtotal: item.subtotal,
            created_at: new_order.created_at,
        });
    }

    let order = Order {
        id: order_id,
        user_id: new_order.user_id,
        order_no: new_order.order_no,
        total_amount: new_order.total_amount,
        status: OrderStatus::Pending,
        is_paid: false,
        payment_time: None,
        created_at: new_order.created_at,
        updated_at: new_order.created_at,
        items: Vec::new(),
    };

    {
        let mut orders = txn.open_table(ORDERS_TABLE)?;
        orders.insert(order_id, encode(&order)?.as_slice())?;

        let mut order_items = txn.open_table(ORDER_ITEMS_TABLE)?;
        for item in &items {
            order_items.insert((order_id, item.id), encode(item)?.as_slice())?;
        }

        let mut index = txn.open_table(USER_ORDERS_TABLE)?;
        index.insert((order.user_id, order_id), ())?;

        let mut numbers = txn.open_table(ORDER_NUMBERS_TABLE)?;
        numbers.insert(order.order_no.as_str(), order_id)?;
    }

    Ok(Order { items, ..order })
}

//! Order workflow: creation and payment

use std::time::Duration;

use shared::models::{Order, OrderCreate, OrderItemCreate, OrderStatistics, OrderStatus};
use shared::request::{CreateOrderItem, PaginationQuery};
use shared::response::PaginatedResponse;
use shared::util::now_millis;

use super::error::{OrderError, OrderResult};
use super::order_no::OrderNoGenerator;
use crate::storage::{InventoryLedger, OrderStore, StatisticsReader};

/// Largest quantity accepted on a single order line
pub const MAX_ITEM_QUANTITY: i32 = 9999;

/// Default budget for one payment transaction
pub const DEFAULT_PAY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Order creation and payment over an injected storage backend
///
/// There is no in-process locking here. Concurrent payments serialize in
/// storage: on the order row lock for the same order, and on the predicated
/// stock decrement for orders sharing a book.
pub struct OrderService<S> {
    storage: S,
    order_no: OrderNoGenerator,
    pay_timeout: Duration,
}

impl<S> OrderService<S>
where
    S: InventoryLedger + OrderStore + StatisticsReader,
{
    pub fn new(storage: S, pay_timeout: Duration) -> Self {
        Self {
            storage,
            order_no: OrderNoGenerator::new(),
            pay_timeout,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ========== Creation ==========

    /// Validate, pre-check the catalog, then persist order and items atomically.
    ///
    /// The stock check here is advisory; payment re-checks under the predicated
    /// decrement.
    pub async fn create_order(&self, user_id: i64, items: &[CreateOrderItem]) -> OrderResult<Order> {
        let lines = validate_items(items)?;

        for item in items {
            let book = self
                .storage
                .get_for_admin(item.book_id)
                .await?
                .ok_or(OrderError::BookNotFound(item.book_id))?;
            if !book.is_active() {
                return Err(OrderError::BookInactive(book.id));
            }
            if book.stock < item.quantity {
                return Err(OrderError::InsufficientStock(book.id));
            }
        }

        let total_amount = lines
            .iter()
            .try_fold(0_i64, |acc, line| acc.checked_add(line.subtotal))
            .ok_or_else(|| OrderError::InvalidItem("order total overflows".into()))?;

        let new_order = OrderCreate {
            user_id,
            order_no: self.order_no.next_order_no(),
            total_amount,
            created_at: now_millis(),
            items: lines,
        };

        let order = self.storage.create_with_items(new_order).await?;
        tracing::info!(
            order_id = order.id,
            order_no = %order.order_no,
            user_id,
            total_amount = order.total_amount,
            items = order.items.len(),
            "Order created"
        );
        Ok(order)
    }

    // ========== Payment ==========

    /// Pay an order in one transaction, bounded by the pay timeout
    pub async fn pay_order(&self, order_id: i64) -> OrderResult<Order> {
        self.pay_with_timeout(order_id, None).await
    }

    /// Pay an order on behalf of its owner; other users get `OrderNotFound`
    pub async fn pay_user_order(&self, user_id: i64, order_id: i64) -> OrderResult<Order> {
        self.pay_with_timeout(order_id, Some(user_id)).await
    }

    /// Stage the payment under the pay timeout, then commit outside it.
    ///
    /// Only staging is cancellable. Once `commit` starts, its outcome is the
    /// payment's outcome, so the caller never sees `Timeout` for a payment
    /// that reached storage.
    async fn pay_with_timeout(&self, order_id: i64, owner: Option<i64>) -> OrderResult<Order> {
        // Dropping the in-flight future drops its transaction, which rolls back
        let staged = match tokio::time::timeout(self.pay_timeout, self.stage_payment(order_id, owner))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    order_id,
                    timeout_ms = self.pay_timeout.as_millis() as u64,
                    "Payment transaction timed out"
                );
                return Err(OrderError::Timeout);
            }
        };

        let StagedPayment {
            tx,
            mut order,
            paid_at,
        } = staged;
        self.storage.commit(tx).await?;

        order.status = OrderStatus::Paid;
        order.is_paid = true;
        order.payment_time = Some(paid_at);
        order.updated_at = paid_at;
        tracing::info!(order_id, user_id = order.user_id, "Order paid");
        Ok(order)
    }

    /// Lock order, decrement stock per item, mark paid; leave `tx` uncommitted.
    ///
    /// Every early return drops `tx`, undoing all decrements made so far.
    async fn stage_payment(
        &self,
        order_id: i64,
        owner: Option<i64>,
    ) -> OrderResult<StagedPayment<S::Tx>> {
        let mut tx = self.storage.begin().await?;

        let order = self
            .storage
            .lock_order_with_items(&mut tx, order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        if let Some(user_id) = owner
            && order.user_id != user_id
        {
            return Err(OrderError::OrderNotFound(order_id));
        }
        if order.is_paid {
            return Err(OrderError::AlreadyPaid(order_id));
        }

        // Fixed book order so two payments touching the same books cannot deadlock
        let mut lines: Vec<_> = order.items.iter().collect();
        lines.sort_by_key(|item| item.book_id);

        for item in lines {
            let applied = self
                .storage
                .decrease_stock_and_record_sale(&mut tx, item.book_id, item.quantity)
                .await?;
            if !applied {
                tracing::info!(
                    order_id,
                    book_id = item.book_id,
                    quantity = item.quantity,
                    "Payment rejected, insufficient stock"
                );
                return Err(OrderError::InsufficientStock(item.book_id));
            }
        }

        let paid_at = now_millis();
        if self.storage.mark_paid(&mut tx, order_id, paid_at).await? == 0 {
            return Err(OrderError::AlreadyPaid(order_id));
        }

        Ok(StagedPayment { tx, order, paid_at })
    }

    // ========== Queries ==========

    pub async fn get_order(&self, order_id: i64) -> OrderResult<Order> {
        self.storage
            .get_order_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    /// Same as [`Self::get_order`], but reports `OrderNotFound` to non-owners
    pub async fn get_user_order(&self, user_id: i64, order_id: i64) -> OrderResult<Order> {
        let order = self.get_order(order_id).await?;
        if order.user_id != user_id {
            return Err(OrderError::OrderNotFound(order_id));
        }
        Ok(order)
    }

    pub async fn get_user_orders(
        &self,
        user_id: i64,
        query: PaginationQuery,
    ) -> OrderResult<PaginatedResponse<Order>> {
        let (page, per_page) = query.normalize();
        let (orders, total) = self
            .storage
            .list_user_orders(user_id, page, per_page)
            .await?;
        Ok(PaginatedResponse::new(orders, page, per_page, total))
    }

    pub async fn get_order_statistics(&self, user_id: i64) -> OrderResult<OrderStatistics> {
        Ok(self.storage.order_statistics(user_id).await?)
    }
}

/// A payment whose writes are applied but not yet committed
struct StagedPayment<Tx> {
    tx: Tx,
    order: Order,
    paid_at: i64,
}

/// Reject bad lines before any storage access and compute subtotals
fn validate_items(items: &[CreateOrderItem]) -> OrderResult<Vec<OrderItemCreate>> {
    if items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    items
        .iter()
        .map(|item| {
            if item.quantity <= 0 || item.quantity > MAX_ITEM_QUANTITY {
                return Err(OrderError::InvalidItem(format!(
                    "quantity for book {} must be between 1 and {MAX_ITEM_QUANTITY}",
                    item.book_id
                )));
            }
            if item.price < 0 {
                return Err(OrderError::InvalidItem(format!(
                    "price for book {} must not be negative",
                    item.book_id
                )));
            }
            let subtotal = item
                .price
                .checked_mul(i64::from(item.quantity))
                .ok_or_else(|| {
                    OrderError::InvalidItem(format!("subtotal for book {} overflows", item.book_id))
                })?;
            Ok(OrderItemCreate {
                book_id: item.book_id,
                quantity: item.quantity,
                price: item.price,
                subtotal,
            })
        })
        .collect()
}

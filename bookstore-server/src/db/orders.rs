//! Order database operations

use std::collections::HashMap;

use shared::models::{Order, OrderCreate, OrderItem};
use sqlx::{PgConnection, PgExecutor, PgPool};

// ── Locked reads (inside the payment transaction) ──

/// `SELECT ... FOR UPDATE` on the order row, items read without a lock
pub async fn lock_order_with_items(
    conn: &mut PgConnection,
    order_id: i64,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, user_id, order_no, total_amount, status, is_paid, payment_time,
               created_at, updated_at
        FROM orders
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(mut order) = order else {
        return Ok(None);
    };
    order.items = items_for_order(&mut *conn, order_id).await?;
    Ok(Some(order))
}

/// Idempotent pay-mark: only an unpaid row is updated
pub async fn mark_paid(
    conn: &mut PgConnection,
    order_id: i64,
    paid_at: i64,
) -> Result<u64, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        UPDATE orders
        SET status = 1, is_paid = TRUE, payment_time = $2, updated_at = $2
        WHERE id = $1 AND is_paid = FALSE
        "#,
    )
    .bind(order_id)
    .bind(paid_at)
    .execute(conn)
    .await?;

    if rows.rows_affected() == 0 {
        tracing::debug!(order_id, "Order already marked paid, nothing to update");
    }
    Ok(rows.rows_affected())
}

// ── Create ──

/// Order row and all item rows in one transaction
pub async fn create_with_items(pool: &PgPool, new_order: &OrderCreate) -> Result<Order, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let mut order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (user_id, order_no, total_amount, status, is_paid, created_at, updated_at)
        VALUES ($1, $2, $3, 0, FALSE, $4, $4)
        RETURNING id, user_id, order_no, total_amount, status, is_paid, payment_time,
                  created_at, updated_at
        "#,
    )
    .bind(new_order.user_id)
    .bind(&new_order.order_no)
    .bind(new_order.total_amount)
    .bind(new_order.created_at)
    .fetch_one(&mut *tx)
    .await?;

    let book_ids: Vec<i64> = new_order.items.iter().map(|i| i.book_id).collect();
    let quantities: Vec<i32> = new_order.items.iter().map(|i| i.quantity).collect();
    let prices: Vec<i64> = new_order.items.iter().map(|i| i.price).collect();
    let subtotals: Vec<i64> = new_order.items.iter().map(|i| i.subtotal).collect();

    order.items = sqlx::query_as::<_, OrderItem>(
        r#"
        INSERT INTO order_items (order_id, book_id, quantity, price, subtotal, created_at)
        SELECT $1, book_id, quantity, price, subtotal, $2
        FROM UNNEST($3::bigint[], $4::integer[], $5::bigint[], $6::bigint[])
            AS t(book_id, quantity, price, subtotal)
        RETURNING id, order_id, book_id, quantity, price, subtotal, created_at
        "#,
    )
    .bind(order.id)
    .bind(new_order.created_at)
    .bind(&book_ids)
    .bind(&quantities)
    .bind(&prices)
    .bind(&subtotals)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(order)
}

// ── Reads ──

pub async fn get_by_id(pool: &PgPool, order_id: i64) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, user_id, order_no, total_amount, status, is_paid, payment_time,
               created_at, updated_at
        FROM orders
        WHERE id = $1
        "#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    let Some(mut order) = order else {
        return Ok(None);
    };
    order.items = items_for_order(pool, order_id).await?;
    Ok(Some(order))
}

/// Newest first, with items, plus the user's total order count
pub async fn list_by_user(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Order>, u64), sqlx::Error> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let mut orders = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, user_id, order_no, total_amount, status, is_paid, payment_time,
               created_at, updated_at
        FROM orders
        WHERE user_id = $1
        ORDER BY id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    if !orders.is_empty() {
        let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, book_id, quantity, price, subtotal, created_at
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }
        for order in &mut orders {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }
    }

    Ok((orders, total.max(0) as u64))
}

async fn items_for_order<'e>(
    executor: impl PgExecutor<'e>,
    order_id: i64,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, order_id, book_id, quantity, price, subtotal, created_at
        FROM order_items
        WHERE order_id = $1
        ORDER BY id
        "#,
    )
    .bind(order_id)
    .fetch_all(executor)
    .await
}

//! Order aggregates

use shared::models::OrderStatistics;
use sqlx::PgPool;

/// One aggregate query, integer arithmetic only
pub async fn order_statistics(pool: &PgPool, user_id: i64) -> Result<OrderStatistics, sqlx::Error> {
    let (total_orders, total_amount, paid_orders): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*)::BIGINT,
               COALESCE(SUM(total_amount), 0)::BIGINT,
               COUNT(*) FILTER (WHERE is_paid)::BIGINT
        FROM orders
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(OrderStatistics {
        total_orders,
        total_amount,
        paid_orders,
        pending_orders: total_orders - paid_orders,
    })
}

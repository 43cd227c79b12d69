//! Order Model

use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// `Pending -> Paid` is the only transition; `Paid` is terminal.
/// `Cancelled` is reserved and never produced by the order flow.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[repr(i16)]
pub enum OrderStatus {
    #[default]
    Pending = 0,
    Paid = 1,
    Cancelled = 2,
}

/// Order line, with the unit price captured at order time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub book_id: i64,
    pub quantity: i32,
    /// Unit price in minor currency units
    pub price: i64,
    /// `price * quantity`
    pub subtotal: i64,
    pub created_at: i64,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub order_no: String,
    /// Sum of item subtotals, fixed at creation
    pub total_amount: i64,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub payment_time: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    #[cfg_attr(feature = "db", sqlx(skip))]
    pub items: Vec<OrderItem>,
}

/// New order line (ids assigned by the store)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemCreate {
    pub book_id: i64,
    pub quantity: i32,
    pub price: i64,
    pub subtotal: i64,
}

/// New order with all of its lines, persisted atomically
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub user_id: i64,
    pub order_no: String,
    pub total_amount: i64,
    pub created_at: i64,
    pub items: Vec<OrderItemCreate>,
}

/// Aggregate over one user's orders
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderStatistics {
    pub total_orders: i64,
    /// Sum of `total_amount` in minor currency units
    pub total_amount: i64,
    pub paid_orders: i64,
    pub pending_orders: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_serde() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Paid).unwrap(),
            "\"paid\""
        );
        let status: OrderStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, OrderStatus::Pending);
        assert_eq!(OrderStatus::Cancelled as i16, 2);
    }

    #[test]
    fn test_order_deserialize_without_items() {
        let json = r#"{
            "id": 1, "user_id": 2, "order_no": "ORD1", "total_amount": 2500,
            "status": "pending", "is_paid": false, "payment_time": null,
            "created_at": 0, "updated_at": 0
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert!(order.items.is_empty());
        assert_eq!(order.total_amount, 2500);
    }
}

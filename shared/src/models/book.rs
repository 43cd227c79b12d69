//! Book Model

use serde::{Deserialize, Serialize};

/// Book sale status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[repr(i16)]
pub enum BookStatus {
    Inactive = 0,
    #[default]
    Active = 1,
}

/// Book entity
///
/// Only `stock` and `sale` change during the order flow, and only through the
/// inventory ledger's conditional decrement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Unit price in minor currency units
    pub price: i64,
    /// Units on hand, never negative
    pub stock: i32,
    /// Cumulative units sold
    pub sale: i64,
    pub status: BookStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Book {
    pub fn is_active(&self) -> bool {
        self.status == BookStatus::Active
    }
}

/// Catalog upsert payload (seeding and administration)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookUpsert {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub price: i64,
    pub stock: i32,
    #[serde(default)]
    pub sale: i64,
    #[serde(default)]
    pub status: BookStatus,
}

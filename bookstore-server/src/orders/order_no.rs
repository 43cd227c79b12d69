//! Order number generation
//!
//! `ORD` followed by a snowflake-style number. The generator never hands out
//! the same or a smaller number twice within a process, even when the clock
//! stalls or two orders land in the same millisecond. Collisions across
//! processes are caught by the store's unique index.

use std::sync::atomic::{AtomicI64, Ordering};

use shared::util::snowflake_id;

pub const ORDER_NO_PREFIX: &str = "ORD";

/// Strictly monotonic per-process order number source
#[derive(Debug, Default)]
pub struct OrderNoGenerator {
    last: AtomicI64,
}

impl OrderNoGenerator {
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    /// Next id: the fresh snowflake if it moves forward, otherwise `last + 1`
    pub fn next_id(&self) -> i64 {
        let candidate = snowflake_id();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = if candidate > last { candidate } else { last + 1 };
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    pub fn next_order_no(&self) -> String {
        format!("{ORDER_NO_PREFIX}{}", self.next_id())
    }
}

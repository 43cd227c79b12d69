use super::*;
use crate::embedded::EmbeddedStorage;
use crate::storage::InventoryLedger;
use shared::models::{Book, BookStatus, BookUpsert, Order};
use shared::request::CreateOrderItem;
use std::time::Duration;

fn create_test_service() -> OrderService<EmbeddedStorage> {
    let storage = EmbeddedStorage::open_in_memory().unwrap();
    OrderService::new(storage, Duration::from_secs(5))
}

async fn seed_book(
    service: &OrderService<EmbeddedStorage>,
    id: i64,
    price: i64,
    stock: i32,
    sale: i64,
) -> Book {
    service
        .storage()
        .upsert_book(BookUpsert {
            id,
            title: format!("Book {id}"),
            author: "Test Author".to_string(),
            price,
            stock,
            sale,
            status: BookStatus::Active,
        })
        .await
        .unwrap()
}

async fn book(service: &OrderService<EmbeddedStorage>, id: i64) -> Book {
    service.storage().get_for_admin(id).await.unwrap().unwrap()
}

fn item(book_id: i64, quantity: i32, price: i64) -> CreateOrderItem {
    CreateOrderItem {
        book_id,
        quantity,
        price,
    }
}

async fn create_order(
    service: &OrderService<EmbeddedStorage>,
    user_id: i64,
    items: Vec<CreateOrderItem>,
) -> Order {
    service.create_order(user_id, &items).await.unwrap()
}

mod test_concurrency;
mod test_queries;

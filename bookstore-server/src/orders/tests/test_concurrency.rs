use super::*;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_overselling_under_concurrent_payments() {
    const STOCK: i32 = 5;
    const BUYERS: i64 = 20;

    let service = Arc::new(create_test_service());
    seed_book(&service, 1, 1000, STOCK, 0).await;

    let mut order_ids = Vec::new();
    for user_id in 1..=BUYERS {
        order_ids.push(create_order(&service, user_id, vec![item(1, 1, 1000)]).await.id);
    }

    let handles: Vec<_> = order_ids
        .into_iter()
        .map(|order_id| {
            let service = service.clone();
            tokio::spawn(async move { service.pay_order(order_id).await })
        })
        .collect();

    let mut succeeded = 0;
    let mut out_of_stock = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(OrderError::InsufficientStock(1)) => out_of_stock += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(succeeded, STOCK as i64);
    assert_eq!(out_of_stock, BUYERS - STOCK as i64);

    let book = book(&service, 1).await;
    assert_eq!(book.stock, 0);
    assert_eq!(book.sale, i64::from(STOCK));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_order_paid_once_under_concurrency() {
    let service = Arc::new(create_test_service());
    seed_book(&service, 1, 1000, 10, 0).await;
    let order = create_order(&service, 1, vec![item(1, 2, 1000)]).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            let order_id = order.id;
            tokio::spawn(async move { service.pay_order(order_id).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(OrderError::AlreadyPaid(_)) => {}
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(succeeded, 1);
    let book = book(&service, 1).await;
    assert_eq!(book.stock, 8);
    assert_eq!(book.sale, 2);
}

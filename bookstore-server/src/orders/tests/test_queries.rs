use super::*;
use shared::models::OrderStatistics;
use shared::request::PaginationQuery;

#[tokio::test]
async fn test_statistics_for_new_user_are_zero() {
    let service = create_test_service();
    let stats = service.get_order_statistics(123).await.unwrap();
    assert_eq!(stats, OrderStatistics::default());
}

#[tokio::test]
async fn test_statistics_after_create_and_pay() {
    let service = create_test_service();
    seed_book(&service, 1, 1000, 10, 0).await;

    let first = create_order(&service, 1, vec![item(1, 2, 1000)]).await;
    create_order(&service, 1, vec![item(1, 1, 1000)]).await;
    create_order(&service, 2, vec![item(1, 1, 1000)]).await;
    service.pay_order(first.id).await.unwrap();

    let stats = service.get_order_statistics(1).await.unwrap();
    assert_eq!(
        stats,
        OrderStatistics {
            total_orders: 2,
            total_amount: 3000,
            paid_orders: 1,
            pending_orders: 1,
        }
    );
}

#[tokio::test]
async fn test_statistics_total_overflow_is_an_error() {
    let service = create_test_service();
    seed_book(&service, 1, 1000, 10, 0).await;
    create_order(&service, 1, vec![item(1, 1, i64::MAX)]).await;
    create_order(&service, 1, vec![item(1, 1, 1)]).await;

    let err = service.get_order_statistics(1).await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::Storage(crate::storage::StorageError::Overflow(_))
    ));
}

#[tokio::test]
async fn test_user_orders_newest_first_with_items() {
    let service = create_test_service();
    seed_book(&service, 1, 100, 100, 0).await;

    let mut created = Vec::new();
    for _ in 0..5 {
        created.push(create_order(&service, 1, vec![item(1, 1, 100)]).await.id);
    }
    create_order(&service, 2, vec![item(1, 1, 100)]).await;

    let page = service
        .get_user_orders(1, PaginationQuery::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.total_pages, 3);
    let ids: Vec<i64> = page.items.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![created[4], created[3]]);
    assert!(page.items.iter().all(|o| o.items.len() == 1));

    let last = service
        .get_user_orders(1, PaginationQuery::new(3, 2))
        .await
        .unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].id, created[0]);
}

#[tokio::test]
async fn test_user_orders_page_size_clamped() {
    let service = create_test_service();
    seed_book(&service, 1, 100, 500, 0).await;
    for _ in 0..15 {
        create_order(&service, 1, vec![item(1, 1, 100)]).await;
    }

    let page = service
        .get_user_orders(1, PaginationQuery::new(0, 0))
        .await
        .unwrap();
    assert_eq!(page.pagination.page, 1);
    assert_eq!(page.pagination.per_page, 12);
    assert_eq!(page.items.len(), 12);

    let page = service
        .get_user_orders(1, PaginationQuery::new(1, 1000))
        .await
        .unwrap();
    assert_eq!(page.pagination.per_page, 100);
    assert_eq!(page.items.len(), 15);
}

#[tokio::test]
async fn test_get_user_order_hides_foreign_orders() {
    let service = create_test_service();
    seed_book(&service, 1, 100, 5, 0).await;
    let order = create_order(&service, 1, vec![item(1, 1, 100)]).await;

    assert_eq!(service.get_user_order(1, order.id).await.unwrap().id, order.id);
    let err = service.get_user_order(2, order.id).await.unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound(_)));
}

//! Order endpoints for the authenticated user

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use shared::error::ApiResponse;
use shared::models::{Order, OrderStatistics};
use shared::request::{CreateOrderRequest, PaginationQuery};
use shared::response::PaginatedResponse;

use crate::auth::UserIdentity;
use crate::state::AppState;

use super::ApiResult;

/// POST /api/orders
pub async fn create_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<Order> {
    let order = state
        .orders
        .create_order(identity.user_id, &req.items)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// GET /api/orders?page=&page_size=
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Query(query): Query<PaginationQuery>,
) -> ApiResult<PaginatedResponse<Order>> {
    let page = state
        .orders
        .get_user_orders(identity.user_id, query)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// GET /api/orders/statistics
pub async fn get_statistics(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<OrderStatistics> {
    let stats = state
        .orders
        .get_order_statistics(identity.user_id)
        .await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(order_id): Path<i64>,
) -> ApiResult<Order> {
    let order = state
        .orders
        .get_user_order(identity.user_id, order_id)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// POST /api/orders/{id}/pay
pub async fn pay_order(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Path(order_id): Path<i64>,
) -> ApiResult<Order> {
    let order = state
        .orders
        .pay_user_order(identity.user_id, order_id)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

//! API routes for bookstore-server

pub mod health;
pub mod orders;

use axum::routing::{get, post};
use axum::{Router, middleware};
use shared::error::{ApiResponse, AppError};
use tower_http::trace::TraceLayer;

use crate::auth::user_auth_middleware;
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<ApiResponse<T>>, AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Order API (JWT authenticated)
    let orders = Router::new()
        .route(
            "/api/orders",
            post(orders::create_order).get(orders::list_orders),
        )
        .route("/api/orders/statistics", get(orders::get_statistics))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/pay", post(orders::pay_order))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(orders)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

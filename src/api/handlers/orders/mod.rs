//! Order handlers, scoped to the authenticated caller.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use tracing::error;

use super::auth::require_auth;

pub mod storage;
pub mod types;

use types::CreateOrder;

// axum handler for POST /v1/orders
pub async fn create_order(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    Json(payload): Json<CreateOrder>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match storage::create_order(&pool.0, principal.user_id, &payload.tickets).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(err) => err.into_response(),
    }
}

// axum handler for GET /v1/orders
pub async fn list_orders(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match storage::fetch_orders_for_user(&pool.0, principal.user_id).await {
        Ok(orders) => Json(orders).into_response(),
        Err(err) => {
            error!("Failed to list orders: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for GET /v1/orders/:id
pub async fn get_order(
    Path(id): Path<i64>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    match storage::fetch_order_for_user(&pool.0, principal.user_id, id).await {
        Ok(Some(order)) => Json(order).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to fetch order {id}: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

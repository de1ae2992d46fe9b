//! Single-ticket creation against an existing order.
//!
//! Runs the same validation and insert path as atomic order creation, so a
//! ticket added here obeys identical range and seat-uniqueness rules.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use tracing::error;

use super::{
    auth::require_auth,
    field_error,
    orders::{
        storage::{self, insert_ticket},
        types::{CreateTicket, TicketSpec},
    },
};

// axum handler for POST /v1/tickets
pub async fn create_ticket(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    Json(payload): Json<CreateTicket>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    // Foreign orders answer like missing ones, ids leak nothing.
    match storage::order_owned_by(&pool.0, payload.order, principal.user_id).await {
        Ok(true) => {}
        Ok(false) => {
            return field_error(
                "order",
                format!("Invalid pk \"{}\" - object does not exist.", payload.order),
            );
        }
        Err(err) => {
            error!("Failed to check order {}: {err}", payload.order);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let mut conn = match pool.0.acquire().await {
        Ok(conn) => conn,
        Err(err) => {
            error!("Failed to acquire database connection: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let spec = TicketSpec {
        cargo: payload.cargo,
        seat: payload.seat,
        journey: payload.journey,
    };

    match insert_ticket(&mut *conn, payload.order, spec).await {
        Ok(ticket) => (StatusCode::CREATED, Json(ticket)).into_response(),
        Err(err) => err.into_response(),
    }
}

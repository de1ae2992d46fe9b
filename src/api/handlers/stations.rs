//! Station catalog handlers.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::error;

use super::{auth::require_auth, field_error};

#[derive(Debug, Serialize)]
pub struct Station {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateStation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

fn station_from_row(row: &PgRow) -> Station {
    Station {
        id: row.get("id"),
        name: row.get("name"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
    }
}

// axum handler for POST /v1/stations
pub async fn create_station(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    Json(payload): Json<CreateStation>,
) -> impl IntoResponse {
    let _principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let name = payload.name.trim();
    if name.is_empty() {
        return field_error("name", "This field may not be blank.");
    }

    let result = sqlx::query(
        r"
        INSERT INTO stations (name, latitude, longitude)
        VALUES ($1, $2, $3)
        RETURNING id, name, latitude, longitude
        ",
    )
    .bind(name)
    .bind(payload.latitude)
    .bind(payload.longitude)
    .fetch_one(&pool.0)
    .await;

    match result {
        Ok(row) => (StatusCode::CREATED, Json(station_from_row(&row))).into_response(),
        Err(err) => {
            error!("Failed to create station: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for GET /v1/stations/:id
pub async fn get_station(
    Path(id): Path<i64>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let _principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let result = sqlx::query("SELECT id, name, latitude, longitude FROM stations WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool.0)
        .await;

    match result {
        Ok(Some(row)) => Json(station_from_row(&row)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to fetch station {id}: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

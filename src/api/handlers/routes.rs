//! Route handlers: a directed source -> destination pair of stations.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::error;

use super::{auth::require_auth, field_error};

/// Stations are rendered by name; ids travel only in requests.
#[derive(Debug, Serialize)]
pub struct RouteView {
    pub id: i64,
    pub source: String,
    pub destination: String,
    pub distance: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoute {
    pub source: i64,
    pub destination: i64,
    pub distance: i64,
}

async fn station_name(pool: &PgPool, id: i64) -> Result<Option<String>, sqlx::Error> {
    let row = sqlx::query("SELECT name FROM stations WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| row.get("name")))
}

// axum handler for POST /v1/routes
pub async fn create_route(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    Json(payload): Json<CreateRoute>,
) -> impl IntoResponse {
    let _principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    if payload.distance < 1 {
        return field_error("distance", "Ensure this value is greater than or equal to 1.");
    }
    let Ok(distance) = i32::try_from(payload.distance) else {
        return field_error(
            "distance",
            format!("Ensure this value is at most {}.", i32::MAX),
        );
    };

    if payload.source == payload.destination {
        return field_error("destination", "destination must differ from source");
    }

    let source_name = match station_name(&pool.0, payload.source).await {
        Ok(Some(name)) => name,
        Ok(None) => {
            return field_error(
                "source",
                format!("Invalid pk \"{}\" - object does not exist.", payload.source),
            );
        }
        Err(err) => {
            error!("Failed to fetch station {}: {err}", payload.source);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let destination_name = match station_name(&pool.0, payload.destination).await {
        Ok(Some(name)) => name,
        Ok(None) => {
            return field_error(
                "destination",
                format!(
                    "Invalid pk \"{}\" - object does not exist.",
                    payload.destination
                ),
            );
        }
        Err(err) => {
            error!("Failed to fetch station {}: {err}", payload.destination);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let result = sqlx::query(
        r"
        INSERT INTO routes (source_id, destination_id, distance)
        VALUES ($1, $2, $3)
        RETURNING id
        ",
    )
    .bind(payload.source)
    .bind(payload.destination)
    .bind(distance)
    .fetch_one(&pool.0)
    .await;

    match result {
        Ok(row) => (
            StatusCode::CREATED,
            Json(RouteView {
                id: row.get("id"),
                source: source_name,
                destination: destination_name,
                distance,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to create route: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for GET /v1/routes/:id
pub async fn get_route(
    Path(id): Path<i64>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let _principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let result = sqlx::query(
        r"
        SELECT r.id, r.distance, ss.name AS source_name, ds.name AS destination_name
        FROM routes r
        JOIN stations ss ON ss.id = r.source_id
        JOIN stations ds ON ds.id = r.destination_id
        WHERE r.id = $1
        ",
    )
    .bind(id)
    .fetch_optional(&pool.0)
    .await;

    match result {
        Ok(Some(row)) => Json(RouteView {
            id: row.get("id"),
            source: row.get("source_name"),
            destination: row.get("destination_name"),
            distance: row.get("distance"),
        })
        .into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to fetch route {id}: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

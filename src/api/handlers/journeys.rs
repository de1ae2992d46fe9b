//! Journey handlers.
//!
//! A journey is one scheduled run of a train over a route. The list view is
//! the storefront: it carries `tickets_available`, the train capacity minus
//! tickets already sold for that journey.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::error;

use super::{auth::require_auth, field_error, TrainLimits};

#[derive(Debug, Deserialize)]
pub struct CreateJourney {
    pub route: i64,
    pub train: i64,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct Journey {
    pub id: i64,
    pub route: i64,
    pub train: i64,
    pub departure_time: String,
    pub arrival_time: String,
}

#[derive(Debug, Serialize)]
pub struct JourneyListItem {
    pub id: i64,
    pub route: String,
    pub train: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub tickets_available: i64,
}

#[derive(Debug, Serialize)]
pub struct TakenSeat {
    pub cargo: i32,
    pub seat: i32,
}

#[derive(Debug, Serialize)]
pub struct JourneyDetail {
    pub id: i64,
    pub route: String,
    pub train: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub taken_seats: Vec<TakenSeat>,
}

// axum handler for POST /v1/journeys
pub async fn create_journey(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    Json(payload): Json<CreateJourney>,
) -> impl IntoResponse {
    let _principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    if payload.arrival_time <= payload.departure_time {
        return field_error("arrival_time", "arrival_time must be after departure_time");
    }

    let route_exists = sqlx::query("SELECT 1 FROM routes WHERE id = $1")
        .bind(payload.route)
        .fetch_optional(&pool.0)
        .await;
    match route_exists {
        Ok(Some(_)) => {}
        Ok(None) => {
            return field_error(
                "route",
                format!("Invalid pk \"{}\" - object does not exist.", payload.route),
            );
        }
        Err(err) => {
            error!("Failed to fetch route {}: {err}", payload.route);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let train_exists = sqlx::query("SELECT 1 FROM trains WHERE id = $1")
        .bind(payload.train)
        .fetch_optional(&pool.0)
        .await;
    match train_exists {
        Ok(Some(_)) => {}
        Ok(None) => {
            return field_error(
                "train",
                format!("Invalid pk \"{}\" - object does not exist.", payload.train),
            );
        }
        Err(err) => {
            error!("Failed to fetch train {}: {err}", payload.train);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO journeys (route_id, train_id, departure_time, arrival_time)
        VALUES ($1, $2, $3, $4)
        RETURNING id,
          to_char(departure_time AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS departure_time,
          to_char(arrival_time AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS arrival_time
        "#,
    )
    .bind(payload.route)
    .bind(payload.train)
    .bind(payload.departure_time)
    .bind(payload.arrival_time)
    .fetch_one(&pool.0)
    .await;

    match result {
        Ok(row) => (
            StatusCode::CREATED,
            Json(Journey {
                id: row.get("id"),
                route: payload.route,
                train: payload.train,
                departure_time: row.get("departure_time"),
                arrival_time: row.get("arrival_time"),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to create journey: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for GET /v1/journeys
pub async fn list_journeys(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    let _principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let result = sqlx::query(
        r#"
        SELECT j.id,
          ss.name AS source_name, ds.name AS destination_name,
          t.name AS train_name, t.cargo_num, t.places_in_cargo,
          to_char(j.departure_time AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS departure_time,
          to_char(j.arrival_time AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS arrival_time,
          (SELECT COUNT(*) FROM tickets k WHERE k.journey_id = j.id) AS tickets_sold
        FROM journeys j
        JOIN routes r ON r.id = j.route_id
        JOIN stations ss ON ss.id = r.source_id
        JOIN stations ds ON ds.id = r.destination_id
        JOIN trains t ON t.id = j.train_id
        ORDER BY j.id
        "#,
    )
    .fetch_all(&pool.0)
    .await;

    match result {
        Ok(rows) => {
            let journeys: Vec<JourneyListItem> = rows
                .iter()
                .map(|row| {
                    let limits = TrainLimits {
                        cargo_num: row.get("cargo_num"),
                        places_in_cargo: row.get("places_in_cargo"),
                    };
                    let sold: i64 = row.get("tickets_sold");
                    let source: String = row.get("source_name");
                    let destination: String = row.get("destination_name");
                    JourneyListItem {
                        id: row.get("id"),
                        route: format!("{source} - {destination}"),
                        train: row.get("train_name"),
                        departure_time: row.get("departure_time"),
                        arrival_time: row.get("arrival_time"),
                        tickets_available: limits.capacity() - sold,
                    }
                })
                .collect();
            Json(journeys).into_response()
        }
        Err(err) => {
            error!("Failed to list journeys: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for GET /v1/journeys/:id
pub async fn get_journey(
    Path(id): Path<i64>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let _principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let result = sqlx::query(
        r#"
        SELECT j.id,
          ss.name AS source_name, ds.name AS destination_name,
          t.name AS train_name,
          to_char(j.departure_time AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS departure_time,
          to_char(j.arrival_time AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS arrival_time
        FROM journeys j
        JOIN routes r ON r.id = j.route_id
        JOIN stations ss ON ss.id = r.source_id
        JOIN stations ds ON ds.id = r.destination_id
        JOIN trains t ON t.id = j.train_id
        WHERE j.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool.0)
    .await;

    let row = match result {
        Ok(Some(row)) => row,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to fetch journey {id}: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let seats = sqlx::query(
        "SELECT cargo, seat FROM tickets WHERE journey_id = $1 ORDER BY cargo, seat",
    )
    .bind(id)
    .fetch_all(&pool.0)
    .await;

    match seats {
        Ok(seat_rows) => {
            let taken_seats = seat_rows
                .iter()
                .map(|seat| TakenSeat {
                    cargo: seat.get("cargo"),
                    seat: seat.get("seat"),
                })
                .collect();
            let source: String = row.get("source_name");
            let destination: String = row.get("destination_name");
            Json(JourneyDetail {
                id: row.get("id"),
                route: format!("{source} - {destination}"),
                train: row.get("train_name"),
                departure_time: row.get("departure_time"),
                arrival_time: row.get("arrival_time"),
                taken_seats,
            })
            .into_response()
        }
        Err(err) => {
            error!("Failed to fetch taken seats for journey {id}: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

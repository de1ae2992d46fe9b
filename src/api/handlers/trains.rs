//! Train and train type handlers.
//!
//! A train carries the seat grid (`cargo_num` x `places_in_cargo`) that every
//! ticket on its journeys is validated against.

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

#[derive(Debug, Serialize)]
pub struct TrainType {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTrainType {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct Train {
    pub id: i64,
    pub name: String,
    pub cargo_num: i32,
    pub places_in_cargo: i32,
    pub train_type: Option<i64>,
    pub train_type_detail: Option<TrainType>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTrain {
    pub name: String,
    pub cargo_num: i64,
    pub places_in_cargo: i64,
    #[serde(default)]
    pub train_type: Option<i64>,
}

/// Counts come in as `i64` so out-of-range input fails validation instead of
/// deserialization; the stored column is `INTEGER`.
fn positive_count(field: &'static str, value: i64) -> Result<i32, axum::response::Response> {
    if value < 1 {
        return Err(field_error(
            field,
            "Ensure this value is greater than or equal to 1.",
        ));
    }
    i32::try_from(value)
        .map_err(|_| field_error(field, format!("Ensure this value is at most {}.", i32::MAX)))
}

// axum handler for POST /v1/train-types
pub async fn create_train_type(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    Json(payload): Json<CreateTrainType>,
) -> impl IntoResponse {
    let _principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let name = payload.name.trim();
    if name.is_empty() {
        return field_error("name", "This field may not be blank.");
    }

    let result = sqlx::query("INSERT INTO train_types (name) VALUES ($1) RETURNING id, name")
        .bind(name)
        .fetch_one(&pool.0)
        .await;

    match result {
        Ok(row) => (
            StatusCode::CREATED,
            Json(TrainType {
                id: row.get("id"),
                name: row.get("name"),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to create train type: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for GET /v1/train-types/:id
pub async fn get_train_type(
    Path(id): Path<i64>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let _principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let result = sqlx::query("SELECT id, name FROM train_types WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool.0)
        .await;

    match result {
        Ok(Some(row)) => Json(TrainType {
            id: row.get("id"),
            name: row.get("name"),
        })
        .into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to fetch train type {id}: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for POST /v1/trains
pub async fn create_train(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    Json(payload): Json<CreateTrain>,
) -> impl IntoResponse {
    let _principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let name = payload.name.trim();
    if name.is_empty() {
        return field_error("name", "This field may not be blank.");
    }

    let cargo_num = match positive_count("cargo_num", payload.cargo_num) {
        Ok(value) => value,
        Err(response) => return response,
    };
    let places_in_cargo = match positive_count("places_in_cargo", payload.places_in_cargo) {
        Ok(value) => value,
        Err(response) => return response,
    };

    let train_type_detail = match payload.train_type {
        Some(type_id) => {
            let row = sqlx::query("SELECT id, name FROM train_types WHERE id = $1")
                .bind(type_id)
                .fetch_optional(&pool.0)
                .await;
            match row {
                Ok(Some(row)) => Some(TrainType {
                    id: row.get("id"),
                    name: row.get("name"),
                }),
                Ok(None) => {
                    return field_error(
                        "train_type",
                        format!("Invalid pk \"{type_id}\" - object does not exist."),
                    );
                }
                Err(err) => {
                    error!("Failed to fetch train type {type_id}: {err}");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
        }
        None => None,
    };

    let result = sqlx::query(
        r"
        INSERT INTO trains (name, cargo_num, places_in_cargo, train_type_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        ",
    )
    .bind(name)
    .bind(cargo_num)
    .bind(places_in_cargo)
    .bind(payload.train_type)
    .fetch_one(&pool.0)
    .await;

    match result {
        Ok(row) => (
            StatusCode::CREATED,
            Json(Train {
                id: row.get("id"),
                name: name.to_string(),
                cargo_num,
                places_in_cargo,
                train_type: payload.train_type,
                train_type_detail,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to create train: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// axum handler for GET /v1/trains/:id
pub async fn get_train(
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
        SELECT t.id, t.name, t.cargo_num, t.places_in_cargo,
               tt.id AS type_id, tt.name AS type_name
        FROM trains t
        LEFT JOIN train_types tt ON tt.id = t.train_type_id
        WHERE t.id = $1
        ",
    )
    .bind(id)
    .fetch_optional(&pool.0)
    .await;

    match result {
        Ok(Some(row)) => {
            let type_id: Option<i64> = row.get("type_id");
            let train_type_detail = type_id.map(|type_id| TrainType {
                id: type_id,
                name: row.get("type_name"),
            });
            Json(Train {
                id: row.get("id"),
                name: row.get("name"),
                cargo_num: row.get("cargo_num"),
                places_in_cargo: row.get("places_in_cargo"),
                train_type: type_id,
                train_type_detail,
            })
            .into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            error!("Failed to fetch train {id}: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

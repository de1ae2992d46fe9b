//! API handlers and shared booking rules.
//!
//! This module organizes the service's route handlers and hosts the seat
//! validation logic shared by single-ticket creation and atomic order
//! creation, so both entry points apply identical rules.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{Map, Value};

pub mod auth;
pub mod health;
pub mod journeys;
pub mod orders;
pub mod routes;
pub mod stations;
pub mod tickets;
pub mod trains;

/// Seat grid of a train as needed by ticket validation: `cargo_num`
/// compartments with `places_in_cargo` seats each, both 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainLimits {
    pub cargo_num: i32,
    pub places_in_cargo: i32,
}

impl TrainLimits {
    /// Total seats a journey on this train can sell.
    #[must_use]
    pub const fn capacity(&self) -> i64 {
        self.cargo_num as i64 * self.places_in_cargo as i64
    }
}

/// Range violation for one dimension of a ticket, scoped to the failing
/// field so API responses can point at `cargo` or `seat` directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRangeError {
    field: &'static str,
    bound_name: &'static str,
    bound: i32,
    value: i64,
}

impl TicketRangeError {
    /// The request field that failed: `cargo` or `seat`.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// Client-facing message naming the allowed range and the offending value.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "{} number must be in available range: (1, {}): (1, {}), got {}",
            self.field, self.bound_name, self.bound, self.value
        )
    }
}

/// `400` response whose body maps the failing request field to a message,
/// so clients can attach the error to the right input.
pub(crate) fn field_error(field: &str, message: impl Into<String>) -> axum::response::Response {
    let mut body = Map::new();
    body.insert(field.to_string(), Value::String(message.into()));
    (StatusCode::BAD_REQUEST, Json(Value::Object(body))).into_response()
}

/// Validate a candidate ticket against a train's seat grid.
///
/// Both dimensions are checked with the same `1 ≤ value ≤ bound` rule, cargo
/// before seat; the first violation wins. Seat uniqueness per journey is not
/// checked here, it is enforced by the tickets unique constraint at insert.
pub fn validate_ticket(cargo: i64, seat: i64, train: &TrainLimits) -> Result<(), TicketRangeError> {
    for (value, field, bound_name, bound) in [
        (cargo, "cargo", "cargo_num", train.cargo_num),
        (seat, "seat", "places_in_cargo", train.places_in_cargo),
    ] {
        if !(1..=i64::from(bound)).contains(&value) {
            return Err(TicketRangeError {
                field,
                bound_name,
                bound,
                value,
            });
        }
    }

    Ok(())
}

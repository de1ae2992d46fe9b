//! SQL storage for orders and tickets.
//!
//! Order creation is a single transaction: the order row plus every ticket,
//! or nothing. Seat uniqueness per journey rides on the
//! `tickets_journey_cargo_seat_key` constraint, so concurrent buyers of the
//! same seat are settled by the database and the loser sees a seat-taken
//! error with no partial rows behind it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::{PgConnection, PgPool, Row};
use tracing::error;
use uuid::Uuid;

use super::types::{JourneySummary, Order, OrderDetail, Ticket, TicketDetail, TicketSpec};
use crate::api::handlers::{field_error, validate_ticket, TicketRangeError, TrainLimits};

#[derive(Debug)]
pub enum OrderError {
    EmptyOrder,
    Range(TicketRangeError),
    SeatTaken { cargo: i64, seat: i64 },
    JourneyNotFound(i64),
    Database(sqlx::Error),
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        match self {
            Self::EmptyOrder => field_error("tickets", "This list may not be empty."),
            Self::Range(err) => field_error(err.field(), err.message()),
            Self::SeatTaken { cargo, seat } => field_error(
                "seat",
                format!("seat {seat} in cargo {cargo} is already taken for this journey"),
            ),
            Self::JourneyNotFound(id) => field_error(
                "journey",
                format!("Invalid pk \"{id}\" - object does not exist."),
            ),
            Self::Database(err) => {
                error!("Database error: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// SQLSTATE 23505, unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Create an order with its tickets atomically for `user_id`.
///
/// Any ticket failure aborts the whole order; nothing is persisted.
pub async fn create_order(
    pool: &PgPool,
    user_id: Uuid,
    specs: &[TicketSpec],
) -> Result<Order, OrderError> {
    if specs.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let mut tx = pool.begin().await.map_err(OrderError::Database)?;

    let row = sqlx::query(
        r#"
        INSERT INTO orders (user_id)
        VALUES ($1)
        RETURNING id,
          to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
        "#,
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(OrderError::Database)?;

    let order_id: i64 = row.get("id");
    let created_at: String = row.get("created_at");

    let mut tickets = Vec::with_capacity(specs.len());
    for spec in specs {
        match insert_ticket(&mut *tx, order_id, *spec).await {
            Ok(ticket) => tickets.push(ticket),
            Err(err) => {
                // Rollback failures are moot, the transaction dies either way.
                let _ = tx.rollback().await;
                return Err(err);
            }
        }
    }

    tx.commit().await.map_err(OrderError::Database)?;

    Ok(Order {
        id: order_id,
        created_at,
        tickets,
    })
}

/// Validate one ticket against its journey's train and insert it.
///
/// Shared by order creation and single-ticket creation so both entry points
/// apply the same range checks and seat-conflict mapping.
pub async fn insert_ticket(
    conn: &mut PgConnection,
    order_id: i64,
    spec: TicketSpec,
) -> Result<Ticket, OrderError> {
    let limits = sqlx::query(
        r"
        SELECT t.cargo_num, t.places_in_cargo
        FROM journeys j
        JOIN trains t ON t.id = j.train_id
        WHERE j.id = $1
        ",
    )
    .bind(spec.journey)
    .fetch_optional(&mut *conn)
    .await
    .map_err(OrderError::Database)?
    .map(|row| TrainLimits {
        cargo_num: row.get("cargo_num"),
        places_in_cargo: row.get("places_in_cargo"),
    })
    .ok_or(OrderError::JourneyNotFound(spec.journey))?;

    validate_ticket(spec.cargo, spec.seat, &limits).map_err(OrderError::Range)?;

    // Validation bounds both values by i32 columns.
    #[allow(clippy::cast_possible_truncation)]
    let (cargo, seat) = (spec.cargo as i32, spec.seat as i32);

    let row = sqlx::query(
        r"
        INSERT INTO tickets (cargo, seat, journey_id, order_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        ",
    )
    .bind(cargo)
    .bind(seat)
    .bind(spec.journey)
    .bind(order_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            OrderError::SeatTaken {
                cargo: spec.cargo,
                seat: spec.seat,
            }
        } else {
            OrderError::Database(err)
        }
    })?;

    Ok(Ticket {
        id: row.get("id"),
        cargo: spec.cargo,
        seat: spec.seat,
        journey: spec.journey,
    })
}

/// `true` when `order_id` exists and belongs to `user_id`.
pub async fn order_owned_by(
    pool: &PgPool,
    order_id: i64,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 FROM orders WHERE id = $1 AND user_id = $2")
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Flattened order/ticket join row, one per ticket (ticket side is `None`
/// for an order whose journeys were deleted underneath it).
struct OrderRow {
    order_id: i64,
    created_at: String,
    ticket: Option<TicketDetail>,
}

const ORDER_QUERY: &str = r#"
    SELECT o.id AS order_id,
      to_char(o.created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
      t.id AS ticket_id, t.cargo, t.seat,
      j.id AS journey_id,
      ss.name AS source_name, ds.name AS destination_name,
      tr.name AS train_name,
      to_char(j.departure_time AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS departure_time,
      to_char(j.arrival_time AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS arrival_time
    FROM orders o
    LEFT JOIN tickets t ON t.order_id = o.id
    LEFT JOIN journeys j ON j.id = t.journey_id
    LEFT JOIN routes r ON r.id = j.route_id
    LEFT JOIN stations ss ON ss.id = r.source_id
    LEFT JOIN stations ds ON ds.id = r.destination_id
    LEFT JOIN trains tr ON tr.id = j.train_id
"#;

fn order_row(row: &sqlx::postgres::PgRow) -> OrderRow {
    let ticket_id: Option<i64> = row.get("ticket_id");
    let ticket = ticket_id.map(|id| {
        let cargo: i32 = row.get("cargo");
        let seat: i32 = row.get("seat");
        let source: String = row.get("source_name");
        let destination: String = row.get("destination_name");
        TicketDetail {
            id,
            cargo: i64::from(cargo),
            seat: i64::from(seat),
            journey: JourneySummary {
                id: row.get("journey_id"),
                route: format!("{source} - {destination}"),
                train: row.get("train_name"),
                departure_time: row.get("departure_time"),
                arrival_time: row.get("arrival_time"),
            },
        }
    });

    OrderRow {
        order_id: row.get("order_id"),
        created_at: row.get("created_at"),
        ticket,
    }
}

/// Group join rows into orders, preserving row order.
fn group_orders(rows: Vec<OrderRow>) -> Vec<OrderDetail> {
    let mut orders: Vec<OrderDetail> = Vec::new();
    for row in rows {
        match orders.last_mut() {
            Some(last) if last.id == row.order_id => {
                if let Some(ticket) = row.ticket {
                    last.tickets.push(ticket);
                }
            }
            _ => orders.push(OrderDetail {
                id: row.order_id,
                created_at: row.created_at,
                tickets: row.ticket.into_iter().collect(),
            }),
        }
    }
    orders
}

/// All orders for `user_id`, newest first.
pub async fn fetch_orders_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<OrderDetail>, sqlx::Error> {
    let sql = format!(
        "{ORDER_QUERY} WHERE o.user_id = $1 ORDER BY o.created_at DESC, o.id DESC, t.cargo, t.seat"
    );
    let rows = sqlx::query(&sql).bind(user_id).fetch_all(pool).await?;
    Ok(group_orders(rows.iter().map(order_row).collect()))
}

/// One order for `user_id`, or `None` when it does not exist or belongs to
/// somebody else. Callers turn `None` into `404` so foreign order ids are
/// indistinguishable from absent ones.
pub async fn fetch_order_for_user(
    pool: &PgPool,
    user_id: Uuid,
    order_id: i64,
) -> Result<Option<OrderDetail>, sqlx::Error> {
    let sql = format!(
        "{ORDER_QUERY} WHERE o.user_id = $1 AND o.id = $2 ORDER BY t.cargo, t.seat"
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    Ok(group_orders(rows.iter().map(order_row).collect()).into_iter().next())
}

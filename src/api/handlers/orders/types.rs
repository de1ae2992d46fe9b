//! Request and response bodies for orders and tickets.

use serde::{Deserialize, Serialize};

/// One requested seat: `cargo`/`seat` are wide on purpose so out-of-range
/// values reach the validator and come back as a range error, not a 422.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TicketSpec {
    pub cargo: i64,
    pub seat: i64,
    pub journey: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    pub tickets: Vec<TicketSpec>,
}

/// Single-ticket creation against an existing order.
#[derive(Debug, Deserialize)]
pub struct CreateTicket {
    pub order: i64,
    pub cargo: i64,
    pub seat: i64,
    pub journey: i64,
}

#[derive(Debug, Serialize)]
pub struct Ticket {
    pub id: i64,
    pub cargo: i64,
    pub seat: i64,
    pub journey: i64,
}

#[derive(Debug, Serialize)]
pub struct Order {
    pub id: i64,
    pub created_at: String,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Serialize)]
pub struct JourneySummary {
    pub id: i64,
    pub route: String,
    pub train: String,
    pub departure_time: String,
    pub arrival_time: String,
}

#[derive(Debug, Serialize)]
pub struct TicketDetail {
    pub id: i64,
    pub cargo: i64,
    pub seat: i64,
    pub journey: JourneySummary,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub id: i64,
    pub created_at: String,
    pub tickets: Vec<TicketDetail>,
}

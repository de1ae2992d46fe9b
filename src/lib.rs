//! # Terminus (Train Station Booking API)
//!
//! `terminus` is a REST API for a train station: it manages trains, stations,
//! routes, journeys and ticket orders on top of Postgres.
//!
//! ## Booking Model (Trains, Journeys, Tickets)
//!
//! A train is a grid of seats: `cargo_num` compartments with
//! `places_in_cargo` seats each. A journey is a scheduled run of a train over
//! a route, and a ticket reserves one `(cargo, seat)` pair on one journey.
//!
//! - **Capacity:** a journey can never sell more than
//!   `cargo_num * places_in_cargo` tickets.
//! - **Seat Uniqueness:** `(journey, cargo, seat)` is unique across all
//!   tickets, enforced by a database constraint so concurrent bookings cannot
//!   double-sell a seat.
//! - **Atomic Orders:** an order and all of its tickets are created in one
//!   transaction; if any ticket is invalid or its seat is taken, nothing from
//!   that request persists.
//!
//! ## Ownership
//!
//! Orders belong to the authenticated user. Listing and retrieving orders is
//! always scoped to the caller; other users' orders return `404 Not Found`
//! rather than `403 Forbidden` to avoid leaking order existence.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

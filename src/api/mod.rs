use crate::api::handlers::{health, journeys, orders, routes, stations, tickets, trains};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;

pub mod handlers;

/// Connection attempts before giving up on the database at startup.
const CONNECT_MAX_ATTEMPTS: u32 = 30;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Build the API router. All `/v1` routes expect a `PgPool` extension and
/// authenticate the caller themselves; `/health` is open.
#[must_use]
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/v1/train-types",
            post(trains::create_train_type),
        )
        .route("/v1/train-types/:id", get(trains::get_train_type))
        .route("/v1/trains", post(trains::create_train))
        .route("/v1/trains/:id", get(trains::get_train))
        .route("/v1/stations", post(stations::create_station))
        .route("/v1/stations/:id", get(stations::get_station))
        .route("/v1/routes", post(routes::create_route))
        .route("/v1/routes/:id", get(routes::get_route))
        .route(
            "/v1/journeys",
            get(journeys::list_journeys).post(journeys::create_journey),
        )
        .route("/v1/journeys/:id", get(journeys::get_journey))
        .route(
            "/v1/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route("/v1/orders/:id", get(orders::get_order))
        .route("/v1/tickets", post(tickets::create_ticket))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(pool.clone())),
        )
        .layer(Extension(pool))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String) -> Result<()> {
    let pool = connect_with_retry(&dsn).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let app = router(pool);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Poll the database until it accepts connections.
///
/// Retrying here keeps container start order flexible; once the server is up,
/// database outages are surfaced per-request as `500`s instead.
async fn connect_with_retry(dsn: &str) -> Result<PgPool> {
    let mut attempt = 1;
    loop {
        let connect = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await;

        match connect {
            Ok(pool) => return Ok(pool),
            Err(err) if attempt < CONNECT_MAX_ATTEMPTS => {
                warn!(
                    attempt,
                    error = %err,
                    "database unavailable, retrying in {}s",
                    CONNECT_RETRY_DELAY.as_secs()
                );
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                attempt += 1;
            }
            Err(err) => {
                return Err(err).context("Failed to connect to database");
            }
        }
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

//! Authenticated principal extraction.
//!
//! Flow Overview: read the bearer token, resolve its hash to a user, and
//! return a principal that downstream handlers can use. Token issuance and
//! session management belong to the identity layer, not this service.

use anyhow::{Context, Result};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use tracing::error;
use uuid::Uuid;

/// Authenticated user context derived from the bearer token.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
}

/// Resolve the request's bearer token into a principal, or return 401.
pub async fn require_auth(headers: &HeaderMap, pool: &PgPool) -> Result<Principal, StatusCode> {
    let Some(token) = bearer_token(headers) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let hash = hash_api_token(token);
    let row = sqlx::query(
        r"
        SELECT u.id, u.email
        FROM users u
        JOIN api_tokens t ON t.user_id = u.id
        WHERE t.token_hash = $1
        ",
    )
    .bind(&hash)
    .fetch_optional(pool)
    .await
    .map_err(|err| {
        error!("Failed to resolve api token: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match row {
        Some(row) => Ok(Principal {
            user_id: row.get("id"),
            email: row.get("email"),
        }),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Generate a random API token for a user.
///
/// # Errors
/// Returns an error if the OS random source fails.
pub fn generate_api_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate api token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Hash an API token so raw values never touch the database.
#[must_use]
pub fn hash_api_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

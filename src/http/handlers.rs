//! Downstream API handlers behind the guard chain.
//!
//! The real business endpoints live elsewhere; these echo what the chain
//! forwarded and show a route-level validator in place.

use axum::body::{Body, Bytes};
use axum::extract::{OriginalUri, Path};
use axum::http::{Method, Request};
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde_json::{json, Value};

use crate::http::request::{ClientIdentifier, UNKNOWN_CLIENT};
use crate::security::validator::{validate_request, Validation};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Routes mounted under the API prefix.
pub fn api_routes() -> Router {
    Router::new()
        .route(
            "/wallet/{address}",
            post(register_wallet).layer(validate_request(wallet_in_path)),
        )
        .fallback(echo)
}

/// Shape check for a Solana wallet address: 32-44 base58 characters.
pub fn wallet_address_shape(address: &str) -> Validation {
    if address.is_empty() {
        return Validation::invalid("Wallet address is required");
    }

    let well_formed = (32..=44).contains(&address.len())
        && address.chars().all(|c| BASE58_ALPHABET.contains(c));
    if well_formed {
        Validation::Valid
    } else {
        Validation::invalid("Invalid Solana wallet address format")
    }
}

fn wallet_in_path(request: &Request<Body>) -> Validation {
    let address = request.uri().path().rsplit('/').next().unwrap_or_default();
    wallet_address_shape(address)
}

async fn register_wallet(Path(address): Path<String>) -> Json<Value> {
    Json(json!({ "wallet": address, "accepted": true }))
}

async fn echo(
    method: Method,
    OriginalUri(uri): OriginalUri,
    client: Option<Extension<ClientIdentifier>>,
    body: Bytes,
) -> Json<Value> {
    let client = client
        .map(|Extension(client)| client.0)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "client": client,
        "body_bytes": body.len(),
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

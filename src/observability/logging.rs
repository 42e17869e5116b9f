//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Emit one completion line per guarded request, leveled by status
//! - Render request bodies for development logs with the wallet masked
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - 5xx logs at error, 4xx at warn, everything else at info
//! - Bodies are only logged in development mode

use axum::http::{Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Call once, from `main`.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("api_guard={level},tower_http={level}", level = default_level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Log a finished API request.
pub fn log_completed(
    method: &Method,
    path: &str,
    status: StatusCode,
    elapsed: Duration,
    request_id: &str,
    body: Option<&str>,
) {
    let duration_ms = elapsed.as_millis() as u64;
    let status = status.as_u16();

    if status >= 500 {
        tracing::error!(request_id, method = %method, path, status, duration_ms, body, "API error");
    } else if status >= 400 {
        tracing::warn!(request_id, method = %method, path, status, duration_ms, body, "API warning");
    } else {
        tracing::info!(request_id, method = %method, path, status, duration_ms, body, "API request");
    }
}

/// Render a JSON request body for logging, masking a string `wallet` field.
///
/// Returns `None` for empty or non-JSON bodies.
pub fn masked_body(bytes: &[u8]) -> Option<String> {
    let mut body: Value = serde_json::from_slice(bytes).ok()?;
    if let Some(wallet) = body.get_mut("wallet") {
        if let Some(address) = wallet.as_str() {
            *wallet = Value::String(mask_wallet(address));
        }
    }
    Some(body.to_string())
}

/// Keep the first and last four characters of a wallet address.
pub fn mask_wallet(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

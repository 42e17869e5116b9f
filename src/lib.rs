//! In-process request guard for a public API.
//!
//! Every API request passes security headers, origin-based CSRF protection,
//! request logging and a per-client fixed-window rate limiter before it
//! reaches a handler. No external state store is involved.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GuardConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

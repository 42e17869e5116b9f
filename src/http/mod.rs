//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → chain.rs (security headers, CSRF, logging, rate limit)
//!     → handlers.rs (downstream API routes, optional validators)
//!     → response.rs (rejections rendered as JSON errors)
//!     → Send to client
//! ```

pub mod chain;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use chain::{guard_middleware, ChainOutcome, GuardChain};
pub use request::{client_identifier, ClientIdentifier, RequestIdExt, X_REQUEST_ID};
pub use response::GuardRejection;
pub use server::HttpServer;

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the health and API routes
//! - Put the guard chain in front of every API route
//! - Wire up tower-http layers (request ID, tracing, timeout, panic capture)
//! - Own the counter store and its sweeper for the server's lifetime

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GuardConfig;
use crate::http::chain::{guard_middleware, ChainError, GuardChain};
use crate::http::handlers;
use crate::http::response::GuardRejection;
use crate::lifecycle::Sweeper;
use crate::security::validator::panic_message;
use crate::security::CounterStore;

/// HTTP server for the guarded API.
pub struct HttpServer {
    router: Router,
    config: GuardConfig,
    store: Arc<CounterStore>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GuardConfig) -> Result<Self, ChainError> {
        let store = Arc::new(CounterStore::new());
        let chain = Arc::new(GuardChain::from_config(&config, store.clone())?);

        tracing::info!(
            allowed_origins = ?chain.csrf().allowed_origins(),
            path_policies = config.rate_limit.policies.len(),
            default_limit = config.rate_limit.default.limit,
            default_window_ms = config.rate_limit.default.window_ms,
            "Guard chain initialized"
        );

        let router = Self::build_router(&config, chain);
        Ok(Self {
            router,
            config,
            store,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GuardConfig, chain: Arc<GuardChain>) -> Router {
        Self::assemble(handlers::api_routes(), config, chain)
    }

    /// Mount `api` under the API prefix behind the guard chain.
    ///
    /// Timeouts and handler panics are answered inside the chain so those
    /// responses still carry the security headers.
    #[allow(deprecated)]
    fn assemble(api: Router, config: &GuardConfig, chain: Arc<GuardChain>) -> Router {
        let api = api
            .layer(CatchPanicLayer::custom(internal_failure))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(chain, guard_middleware));

        Router::new()
            .route("/health", get(handlers::health))
            .nest(&config.api_prefix, api)
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then stop the sweeper and
    /// clear the counter store.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = Sweeper::new(
            self.store.clone(),
            Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
        );
        let sweeper_handle = sweeper.spawn(shutdown.resubscribe());

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await;

        sweeper_handle.abort();
        self.store.shutdown();

        tracing::info!("HTTP server stopped");
        result
    }

    /// Router with all layers, for driving the service without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn store(&self) -> Arc<CounterStore> {
        self.store.clone()
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}

/// Panics in downstream handlers become a JSON 500.
fn internal_failure(payload: Box<dyn Any + Send + 'static>) -> Response {
    GuardRejection::Internal(panic_message(payload.as_ref())).into_response()
}

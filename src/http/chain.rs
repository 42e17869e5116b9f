//! The guard chain every API request passes through.
//!
//! # Data Flow
//! ```text
//! request
//!     → security headers (applied to whatever response leaves the chain)
//!     → CSRF guard        ── reject → 403
//!     → request logging   (observes status and latency on the way out)
//!     → rate limiter      ── reject → 429
//!     → downstream handler
//! ```
//!
//! # Design Decisions
//! - Stages run in a fixed order; the first rejection ends the chain
//! - A CSRF rejection never reaches the limiter, so it costs no quota
//! - The pre-handler decision is synchronous and usable without a router

use axum::body::Body;
use axum::extract::{ConnectInfo, OriginalUri, State};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{ClientIpConfig, GuardConfig};
use crate::http::request::{client_identifier, ClientIdentifier, RequestIdExt};
use crate::http::response::GuardRejection;
use crate::observability::{logging, metrics};
use crate::security::rate_limit::{Admission, QuotaHeaders};
use crate::security::{now_millis, CsrfGuard, CounterStore, PolicyTable, RateLimiter, SecurityHeaders};

/// Result of running the pre-handler stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Continue to the downstream handler; attach these quota headers.
    Forwarded(QuotaHeaders),
    /// Stop here with this rejection.
    ShortCircuited(GuardRejection),
}

/// Errors building a chain from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("invalid security header value: {0}")]
    InvalidHeader(#[from] axum::http::header::InvalidHeaderValue),
}

/// Ordered composition of the guard stages.
#[derive(Debug, Clone)]
pub struct GuardChain {
    headers: SecurityHeaders,
    csrf: CsrfGuard,
    limiter: RateLimiter,
    client_ip: ClientIpConfig,
    /// Byte limit for buffering bodies into the request log; development only.
    body_log_limit: Option<usize>,
}

impl GuardChain {
    pub fn new(
        headers: SecurityHeaders,
        csrf: CsrfGuard,
        limiter: RateLimiter,
        client_ip: ClientIpConfig,
    ) -> Self {
        Self {
            headers,
            csrf,
            limiter,
            client_ip,
            body_log_limit: None,
        }
    }

    /// Include request bodies (wallet masked) in completion logs.
    pub fn with_body_logging(mut self, limit: usize) -> Self {
        self.body_log_limit = Some(limit);
        self
    }

    /// Build every stage from configuration around a shared counter store.
    pub fn from_config(config: &GuardConfig, store: Arc<CounterStore>) -> Result<Self, ChainError> {
        let policies = PolicyTable::new(config.rate_limit.policies.clone(), config.rate_limit.default);

        let chain = Self::new(
            SecurityHeaders::from_config(&config.security)?,
            CsrfGuard::from_config(&config.csrf),
            RateLimiter::new(policies, store),
            config.client_ip.clone(),
        );

        Ok(if config.csrf.development {
            chain.with_body_logging(config.listener.max_body_bytes)
        } else {
            chain
        })
    }

    pub fn store(&self) -> &Arc<CounterStore> {
        self.limiter.store()
    }

    pub fn csrf(&self) -> &CsrfGuard {
        &self.csrf
    }

    /// Run the CSRF and rate limit stages for one request.
    pub fn inspect(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        identifier: &str,
        now: u64,
    ) -> ChainOutcome {
        let origin = header_str(headers, header::ORIGIN.as_str());
        let referer = header_str(headers, header::REFERER.as_str());

        if !self.csrf.check(method, origin, referer) {
            tracing::warn!(
                method = %method,
                path = %path,
                origin = origin.unwrap_or_default(),
                referer = referer.unwrap_or_default(),
                "CSRF protection: invalid origin"
            );
            return ChainOutcome::ShortCircuited(GuardRejection::ForbiddenOrigin);
        }

        match self.limiter.admit(identifier, path, now) {
            Admission::Allowed(quota) => ChainOutcome::Forwarded(quota),
            Admission::Rejected {
                scope,
                retry_after_secs,
            } => {
                tracing::warn!(
                    client = %identifier,
                    path = %path,
                    scope = scope.as_str(),
                    retry_after_secs,
                    "Rate limit exceeded"
                );
                ChainOutcome::ShortCircuited(GuardRejection::QuotaExceeded {
                    scope,
                    retry_after_secs,
                })
            }
        }
    }

    fn identify(&self, request: &Request<Body>) -> String {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        client_identifier(request.headers(), peer, &self.client_ip)
    }

    fn finish(&self, mut response: Response) -> Response {
        self.headers.apply(response.headers_mut());
        response
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Axum middleware running the guard chain in front of the API routes.
pub async fn guard_middleware(
    State(chain): State<Arc<GuardChain>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    // Nested routers see a stripped URI; policies match the full path
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let identifier = chain.identify(&request);
    let request_id = request.request_id().to_string();

    match chain.inspect(&method, &path, request.headers(), &identifier, now_millis()) {
        ChainOutcome::ShortCircuited(rejection) => {
            metrics::record_rejection(rejection.reason());
            if rejection != GuardRejection::ForbiddenOrigin {
                logging::log_completed(&method, &path, rejection.status(), started.elapsed(), &request_id, None);
            }
            chain.finish(rejection.into_response())
        }
        ChainOutcome::Forwarded(quota) => {
            metrics::record_forwarded();
            request.extensions_mut().insert(ClientIdentifier(identifier));

            let mut body_log = None;
            if let Some(limit) = chain.body_log_limit {
                let (parts, body) = request.into_parts();
                let bytes = match axum::body::to_bytes(body, limit).await {
                    Ok(bytes) => bytes,
                    Err(_) => return chain.finish(StatusCode::PAYLOAD_TOO_LARGE.into_response()),
                };
                body_log = logging::masked_body(&bytes);
                request = Request::from_parts(parts, Body::from(bytes));
            }

            let mut response = next.run(request).await;
            quota.apply(response.headers_mut());

            logging::log_completed(
                &method,
                &path,
                response.status(),
                started.elapsed(),
                &request_id,
                body_log.as_deref(),
            );
            chain.finish(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::rate_limit::QuotaScope;
    use axum::http::HeaderValue;

    const T0: u64 = 1_700_000_000_000;

    fn chain() -> GuardChain {
        GuardChain::from_config(&GuardConfig::default(), Arc::new(CounterStore::new())).unwrap()
    }

    fn with_origin(origin: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, HeaderValue::from_static(origin));
        headers
    }

    #[test]
    fn test_forged_origin_never_reaches_limiter() {
        let chain = chain();
        let outcome = chain.inspect(
            &Method::POST,
            "/api/anything",
            &with_origin("https://evil.example"),
            "1.2.3.4",
            T0,
        );

        assert_eq!(outcome, ChainOutcome::ShortCircuited(GuardRejection::ForbiddenOrigin));
        assert!(chain.store().get("1.2.3.4").is_none());
    }

    #[test]
    fn test_trusted_mutation_forwarded_with_quota() {
        let chain = chain();
        let outcome = chain.inspect(
            &Method::POST,
            "/api/claimRewards",
            &with_origin("https://tesola.xyz"),
            "1.2.3.4",
            T0,
        );

        match outcome {
            ChainOutcome::Forwarded(quota) => {
                assert_eq!(quota.limit, 5);
                assert_eq!(quota.remaining, 4);
            }
            other => panic!("expected forward, got {:?}", other),
        }
    }

    #[test]
    fn test_quota_rejection_after_csrf_pass() {
        let chain = chain();
        let headers = with_origin("https://tesola.xyz");
        for _ in 0..5 {
            chain.inspect(&Method::POST, "/api/claimRewards", &headers, "id", T0);
        }

        let outcome = chain.inspect(&Method::POST, "/api/claimRewards", &headers, "id", T0 + 500);
        assert_eq!(
            outcome,
            ChainOutcome::ShortCircuited(GuardRejection::QuotaExceeded {
                scope: QuotaScope::Path,
                retry_after_secs: 60,
            })
        );
    }
}

//! Generic request validation layer.
//!
//! Wraps any predicate over the incoming request. A failed predicate, or one
//! that panics, short-circuits with `400 {"error": ...}`; otherwise the
//! request continues to the inner service untouched.

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::http::response::GuardRejection;
use crate::observability::metrics;

/// Result of a request predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(String),
}

impl Validation {
    pub fn invalid(message: impl Into<String>) -> Self {
        Validation::Invalid(message.into())
    }
}

/// A check over an incoming request.
pub trait RequestPredicate: Send + Sync + 'static {
    fn validate(&self, request: &Request<Body>) -> Validation;
}

impl<F> RequestPredicate for F
where
    F: Fn(&Request<Body>) -> Validation + Send + Sync + 'static,
{
    fn validate(&self, request: &Request<Body>) -> Validation {
        self(request)
    }
}

/// Run a predicate, turning failures and panics into a rejection.
pub fn run_predicate<P>(predicate: &P, request: &Request<Body>) -> Result<(), GuardRejection>
where
    P: RequestPredicate + ?Sized,
{
    match catch_unwind(AssertUnwindSafe(|| predicate.validate(request))) {
        Ok(Validation::Valid) => Ok(()),
        Ok(Validation::Invalid(message)) => Err(GuardRejection::ValidationFailed(message)),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(error = %message, path = %request.uri().path(), "Validation error");
            Err(GuardRejection::ValidationFailed(message))
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Request validation failed".to_string()
    }
}

/// Wrap `predicate` into a layer that validates before the inner service runs.
pub fn validate_request<P: RequestPredicate>(predicate: P) -> RequestValidatorLayer<P> {
    RequestValidatorLayer::new(predicate)
}

pub struct RequestValidatorLayer<P> {
    predicate: Arc<P>,
}

impl<P> RequestValidatorLayer<P> {
    pub fn new(predicate: P) -> Self {
        Self {
            predicate: Arc::new(predicate),
        }
    }
}

impl<P> Clone for RequestValidatorLayer<P> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
        }
    }
}

impl<S, P> Layer<S> for RequestValidatorLayer<P> {
    type Service = RequestValidator<S, P>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestValidator {
            inner,
            predicate: self.predicate.clone(),
        }
    }
}

pub struct RequestValidator<S, P> {
    inner: S,
    predicate: Arc<P>,
}

impl<S: Clone, P> Clone for RequestValidator<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

impl<S, P> Service<Request<Body>> for RequestValidator<S, P>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    P: RequestPredicate,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        if let Err(rejection) = run_predicate(self.predicate.as_ref(), &request) {
            metrics::record_rejection(rejection.reason());
            return Box::pin(async move { Ok(rejection.into_response()) });
        }

        // The readied service goes with this call; the clone waits for the next
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(request).await })
    }
}

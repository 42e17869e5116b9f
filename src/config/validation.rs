//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits and windows > 0, addresses parse)
//! - Detect duplicate policy keywords
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderValue;
use std::collections::HashSet;
use std::net::SocketAddr;
use url::Url;

use crate::config::schema::GuardConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("rate_limit policy '{keyword}' must have limit > 0 and window_ms > 0")]
    EmptyPolicy { keyword: String },

    #[error("rate_limit policy keyword must not be empty")]
    EmptyKeyword,

    #[error("rate_limit policy keyword '{0}' is listed more than once")]
    DuplicateKeyword(String),

    #[error("rate_limit.sweep_interval_secs must be > 0")]
    SweepInterval,

    #[error("timeouts.request_secs must be > 0")]
    RequestTimeout,

    #[error("csrf.{field} '{value}' is not an http(s) origin")]
    Origin { field: &'static str, value: String },

    #[error("security.{0} is not a valid header value")]
    HeaderValue(&'static str),

    #[error("api_prefix '{0}' must start with '/' and not end with it")]
    ApiPrefix(String),
}

/// Check a parsed configuration, collecting every problem.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    let rate_limit = &config.rate_limit;
    if rate_limit.default.limit == 0 || rate_limit.default.window_ms == 0 {
        errors.push(ValidationError::EmptyPolicy {
            keyword: "default".to_string(),
        });
    }
    let mut seen = HashSet::new();
    for policy in &rate_limit.policies {
        if policy.keyword.is_empty() {
            errors.push(ValidationError::EmptyKeyword);
        } else if !seen.insert(policy.keyword.as_str()) {
            errors.push(ValidationError::DuplicateKeyword(policy.keyword.clone()));
        }
        if policy.limit == 0 || policy.window_ms == 0 {
            errors.push(ValidationError::EmptyPolicy {
                keyword: policy.keyword.clone(),
            });
        }
    }
    if rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::SweepInterval);
    }

    let csrf = &config.csrf;
    let mut origins = vec![
        ("fallback_app_url", &csrf.fallback_app_url),
        ("production_origin", &csrf.production_origin),
        ("development_origin", &csrf.development_origin),
    ];
    if let Some(app_url) = &csrf.app_url {
        origins.push(("app_url", app_url));
    }
    for (field, value) in origins {
        if !is_http_origin(value) {
            errors.push(ValidationError::Origin {
                field,
                value: value.clone(),
            });
        }
    }

    if HeaderValue::from_str(&config.security.content_security_policy).is_err() {
        errors.push(ValidationError::HeaderValue("content_security_policy"));
    }
    if HeaderValue::from_str(&config.security.referrer_policy).is_err() {
        errors.push(ValidationError::HeaderValue("referrer_policy"));
    }

    let prefix = &config.api_prefix;
    if !prefix.starts_with('/') || prefix.len() < 2 || prefix.ends_with('/') {
        errors.push(ValidationError::ApiPrefix(prefix.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_origin(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

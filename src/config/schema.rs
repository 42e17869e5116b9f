//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::security::policy::{default_path_policies, PathPolicy, Policy};

/// Root configuration for the API guard.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting policies and sweeper cadence.
    pub rate_limit: RateLimitConfig,

    /// Origin allowlist inputs for CSRF protection.
    pub csrf: CsrfConfig,

    /// Defensive response headers.
    pub security: SecurityConfig,

    /// Which forwarding headers identify the client.
    pub client_ip: ClientIpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Path prefix whose requests pass through the guard chain.
    pub api_prefix: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            rate_limit: RateLimitConfig::default(),
            csrf: CsrfConfig::default(),
            security: SecurityConfig::default(),
            client_ip: ClientIpConfig::default(),
            observability: ObservabilityConfig::default(),
            api_prefix: "/api".to_string(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Policy for paths matching no keyword.
    pub default: Policy,

    /// Keyword policies, checked in order; first match wins.
    pub policies: Vec<PathPolicy>,

    /// How often expired client records are evicted.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default: Policy::DEFAULT,
            policies: default_path_policies(),
            sweep_interval_secs: 60,
        }
    }
}

/// CSRF allowlist configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Public application URL. Overridden by `APP_URL`.
    pub app_url: Option<String>,

    /// Used when `app_url` is unset.
    pub fallback_app_url: String,

    /// Production site origin, always allowed.
    pub production_origin: String,

    /// Local development origin, allowed only in development mode.
    pub development_origin: String,

    /// Development mode. Overridden by `APP_ENV`.
    pub development: bool,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            app_url: None,
            fallback_app_url: "http://localhost:3000".to_string(),
            production_origin: "https://tesola.xyz".to_string(),
            development_origin: "http://localhost:3000".to_string(),
            development: false,
        }
    }
}

/// Security header configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// `Strict-Transport-Security` max-age.
    pub hsts_max_age_secs: u64,

    pub content_security_policy: String,

    pub referrer_policy: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            hsts_max_age_secs: 31_536_000,
            content_security_policy: "default-src 'self'".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
        }
    }
}

/// Client identification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientIpConfig {
    /// Honor `X-Forwarded-For` (set by the fronting proxy).
    pub trust_forwarded_for: bool,

    /// Honor `X-Real-IP`.
    pub trust_real_ip: bool,
}

impl Default for ClientIpConfig {
    fn default() -> Self {
        Self {
            trust_forwarded_for: true,
            trust_real_ip: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

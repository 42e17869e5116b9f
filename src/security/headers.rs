//! Defensive response headers.
//!
//! Every response leaving the guard chain carries the same fixed set,
//! whether it came from the downstream handler or a rejection.

use axum::http::header::{
    CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::config::SecurityConfig;

#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl SecurityHeaders {
    pub fn from_config(config: &SecurityConfig) -> Result<Self, InvalidHeaderValue> {
        let hsts = format!("max-age={}; includeSubDomains", config.hsts_max_age_secs);

        let headers = vec![
            (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
            (X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
            (STRICT_TRANSPORT_SECURITY, HeaderValue::from_str(&hsts)?),
            (
                CONTENT_SECURITY_POLICY,
                HeaderValue::from_str(&config.content_security_policy)?,
            ),
            (REFERRER_POLICY, HeaderValue::from_str(&config.referrer_policy)?),
        ];

        Ok(Self { headers })
    }

    /// Overwrite the security headers on an outgoing response.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headers_applied() {
        let injector = SecurityHeaders::from_config(&SecurityConfig::default()).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));

        injector.apply(&mut headers);

        assert_eq!(headers[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[X_XSS_PROTECTION], "1; mode=block");
        assert_eq!(
            headers[STRICT_TRANSPORT_SECURITY],
            "max-age=31536000; includeSubDomains"
        );
        assert_eq!(headers[CONTENT_SECURITY_POLICY], "default-src 'self'");
        assert_eq!(headers[REFERRER_POLICY], "strict-origin-when-cross-origin");
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let config = SecurityConfig {
            content_security_policy: "default-src\n'self'".to_string(),
            ..SecurityConfig::default()
        };
        assert!(SecurityHeaders::from_config(&config).is_err());
    }
}

//! Request inspection helpers.
//!
//! # Responsibilities
//! - Derive the client identifier that keys rate limit state
//! - Expose the request ID assigned by the request-id layer
//!
//! # Design Decisions
//! - Forwarding headers are honored only when configured as trusted
//! - `X-Forwarded-For` contributes its first (client-most) hop
//! - Identification never fails: the last resort is the literal `"unknown"`

use axum::body::Body;
use axum::http::{HeaderMap, Request};
use std::net::SocketAddr;

use crate::config::ClientIpConfig;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Identifier of the calling client, inserted into request extensions once
/// the guard chain admits the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentifier(pub String);

impl ClientIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resolve the rate limit key for a request.
///
/// Order: first `X-Forwarded-For` hop, `X-Real-IP`, peer address, `"unknown"`.
pub fn client_identifier(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust: &ClientIpConfig,
) -> String {
    if trust.trust_forwarded_for {
        if let Some(hop) = header_str(headers, X_FORWARDED_FOR)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty())
        {
            return hop.to_string();
        }
    }

    if trust.trust_real_ip {
        if let Some(ip) = header_str(headers, X_REAL_IP)
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Access to the request ID set by `SetRequestIdLayer`.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl RequestIdExt for Request<Body> {
    fn request_id(&self) -> &str {
        header_str(self.headers(), X_REQUEST_ID).unwrap_or(UNKNOWN_CLIENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.9:51234".parse().unwrap())
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("1.2.3.4, 10.0.0.1"));
        headers.insert(X_REAL_IP, HeaderValue::from_static("5.5.5.5"));
        assert_eq!(client_identifier(&headers, peer(), &ClientIpConfig::default()), "1.2.3.4");
    }

    #[test]
    fn test_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REAL_IP, HeaderValue::from_static("5.5.5.5"));
        assert_eq!(client_identifier(&headers, peer(), &ClientIpConfig::default()), "5.5.5.5");
    }

    #[test]
    fn test_peer_then_unknown() {
        let headers = HeaderMap::new();
        let trust = ClientIpConfig::default();
        assert_eq!(client_identifier(&headers, peer(), &trust), "10.0.0.9");
        assert_eq!(client_identifier(&headers, None, &trust), "unknown");
    }

    #[test]
    fn test_untrusted_headers_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("1.2.3.4"));
        headers.insert(X_REAL_IP, HeaderValue::from_static("5.5.5.5"));
        let trust = ClientIpConfig {
            trust_forwarded_for: false,
            trust_real_ip: false,
        };
        assert_eq!(client_identifier(&headers, peer(), &trust), "10.0.0.9");
    }

    #[test]
    fn test_blank_forwarded_for_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(" "));
        assert_eq!(client_identifier(&headers, None, &ClientIpConfig::default()), "unknown");
    }
}

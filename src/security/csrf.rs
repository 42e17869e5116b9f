//! Origin-based CSRF protection for mutating requests.
//!
//! # Responsibilities
//! - Build the origin allowlist from configuration
//! - Reject POST/PUT/DELETE/PATCH whose Origin/Referer is not allowlisted
//!
//! # Design Decisions
//! - Safe methods always pass
//! - `Origin` must equal an allowlisted origin exactly
//! - `Referer` must start with an allowlisted origin followed by a path,
//!   query, fragment or nothing, so `https://site.xyz.evil.example` fails
//! - Pure: no state beyond the allowlist fixed at construction

use axum::http::Method;

use crate::config::CsrfConfig;

#[derive(Debug, Clone)]
pub struct CsrfGuard {
    allowed_origins: Vec<String>,
}

impl CsrfGuard {
    /// Build a guard from an explicit allowlist.
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed_origins: Vec<String> = Vec::new();
        for origin in origins {
            let origin = normalize_origin(origin.as_ref());
            if !origin.is_empty() && !allowed_origins.contains(&origin) {
                allowed_origins.push(origin);
            }
        }
        Self { allowed_origins }
    }

    /// Application URL (or its fallback) plus the production origin, plus the
    /// local development origin when running in development mode.
    pub fn from_config(config: &CsrfConfig) -> Self {
        let app_url = config
            .app_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&config.fallback_app_url);

        let mut origins = vec![app_url, config.production_origin.as_str()];
        if config.development {
            origins.push(config.development_origin.as_str());
        }

        Self::new(origins)
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn is_mutating(method: &Method) -> bool {
        matches!(
            *method,
            Method::POST | Method::PUT | Method::DELETE | Method::PATCH
        )
    }

    /// Returns true if the request may proceed.
    pub fn check(&self, method: &Method, origin: Option<&str>, referer: Option<&str>) -> bool {
        if !Self::is_mutating(method) {
            return true;
        }

        let origin = origin.unwrap_or_default();
        let referer = referer.unwrap_or_default();

        self.allowed_origins
            .iter()
            .any(|allowed| origin == allowed || referer_matches(referer, allowed))
    }
}

fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_string()
}

fn referer_matches(referer: &str, allowed: &str) -> bool {
    match referer.strip_prefix(allowed) {
        Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(development: bool) -> CsrfConfig {
        CsrfConfig {
            app_url: Some("https://app.example.com".to_string()),
            development,
            ..CsrfConfig::default()
        }
    }

    #[test]
    fn test_safe_methods_always_pass() {
        let guard = CsrfGuard::from_config(&config(false));
        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert!(guard.check(&method, Some("https://evil.example"), Some("https://evil.example/x")));
            assert!(guard.check(&method, None, None));
        }
    }

    #[test]
    fn test_mutation_without_origin_rejected() {
        let guard = CsrfGuard::from_config(&config(false));
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            assert!(!guard.check(&method, None, None));
            assert!(!guard.check(&method, None, Some("https://evil.example/page")));
        }
    }

    #[test]
    fn test_exact_origin_match() {
        let guard = CsrfGuard::from_config(&config(false));
        assert!(guard.check(&Method::POST, Some("https://app.example.com"), None));
        assert!(guard.check(&Method::POST, Some("https://tesola.xyz"), None));
        assert!(!guard.check(&Method::POST, Some("https://app.example.com.evil.example"), None));
        assert!(!guard.check(&Method::POST, Some("https://evil.example"), None));
    }

    #[test]
    fn test_referer_prefix_match() {
        let guard = CsrfGuard::from_config(&config(false));
        assert!(guard.check(&Method::POST, None, Some("https://tesola.xyz/mint?step=2")));
        assert!(guard.check(&Method::POST, Some("null"), Some("https://app.example.com")));
        assert!(!guard.check(&Method::POST, None, Some("https://tesola.xyz.evil.example/")));
    }

    #[test]
    fn test_development_origin_only_in_development() {
        let prod = CsrfGuard::from_config(&config(false));
        assert!(!prod.check(&Method::POST, Some("http://localhost:3000"), None));

        let dev = CsrfGuard::from_config(&config(true));
        assert!(dev.check(&Method::POST, Some("http://localhost:3000"), None));
    }

    #[test]
    fn test_fallback_app_url_and_dedup() {
        let guard = CsrfGuard::from_config(&CsrfConfig {
            app_url: None,
            development: true,
            ..CsrfConfig::default()
        });
        assert_eq!(
            guard.allowed_origins(),
            &["http://localhost:3000".to_string(), "https://tesola.xyz".to_string()]
        );
    }

    #[test]
    fn test_trailing_slash_in_configured_url() {
        let guard = CsrfGuard::new(["https://app.example.com/"]);
        assert!(guard.check(&Method::POST, Some("https://app.example.com"), None));
    }
}

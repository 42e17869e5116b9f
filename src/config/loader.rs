//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GuardConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Public application URL used for the CSRF allowlist.
pub const ENV_APP_URL: &str = "APP_URL";
/// `development` enables the local development origin.
pub const ENV_APP_ENV: &str = "APP_ENV";
/// Listener bind address override.
pub const ENV_BIND: &str = "GUARD_BIND";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML file, apply environment overrides, and validate.
pub fn load_config(path: &Path) -> Result<GuardConfig, ConfigError> {
    finalize(read_config(path)?)
}

/// Parse a TOML file without overrides or validation.
pub fn read_config(path: &Path) -> Result<GuardConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply process environment overrides to `config` and validate it.
pub fn finalize(mut config: GuardConfig) -> Result<GuardConfig, ConfigError> {
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validated(config)
}

/// Accept `config` only if it passes validation.
pub fn validated(config: GuardConfig) -> Result<GuardConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Override settings from environment variables, read through `lookup`.
pub fn apply_env_overrides<F>(config: &mut GuardConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_APP_URL).filter(|u| !u.trim().is_empty()) {
        config.csrf.app_url = Some(url);
    }

    if let Some(env) = lookup(ENV_APP_ENV) {
        config.csrf.development = env.eq_ignore_ascii_case("development");
    }

    if let Some(bind) = lookup(ENV_BIND).filter(|b| !b.trim().is_empty()) {
        config.listener.bind_address = bind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config: GuardConfig = toml::from_str("").unwrap();
        assert_eq!(config.rate_limit.default.limit, 30);
        assert_eq!(config.rate_limit.policies.len(), 7);
        assert_eq!(config.api_prefix, "/api");
    }

    #[test]
    fn test_policies_keep_file_order() {
        let config: GuardConfig = toml::from_str(
            r#"
            api_prefix = "/v1"

            [rate_limit]
            sweep_interval_secs = 10

            [rate_limit.default]
            limit = 100
            window_ms = 10000

            [[rate_limit.policies]]
            keyword = "mint"
            limit = 2
            window_ms = 60000

            [[rate_limit.policies]]
            keyword = "admin"
            limit = 50
            window_ms = 60000
            "#,
        )
        .unwrap();

        let keywords: Vec<_> = config.rate_limit.policies.iter().map(|p| p.keyword.as_str()).collect();
        assert_eq!(keywords, ["mint", "admin"]);
        assert_eq!(config.rate_limit.default.limit, 100);
        assert_eq!(config.rate_limit.sweep_interval_secs, 10);
        assert_eq!(config.api_prefix, "/v1");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_APP_URL, "https://app.example.com"),
            (ENV_APP_ENV, "Development"),
            (ENV_BIND, "127.0.0.1:9000"),
        ]
        .into_iter()
        .collect();

        let mut config = GuardConfig::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.csrf.app_url.as_deref(), Some("https://app.example.com"));
        assert!(config.csrf.development);
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");

        apply_env_overrides(&mut config, |k| (k == ENV_APP_ENV).then(|| "production".to_string()));
        assert!(!config.csrf.development);
    }

    #[test]
    fn test_validation_error_message_lists_all() {
        let err = ConfigError::Validation(vec![
            ValidationError::SweepInterval,
            ValidationError::RequestTimeout,
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: rate_limit.sweep_interval_secs must be > 0, timeouts.request_secs must be > 0"
        );
    }
}

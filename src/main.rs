//! API guard service.
//!
//! Serves the API behind an in-process guard chain.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request-id / trace / timeout layers
//!                          │
//!                          ▼
//!                    ┌───────────────────────────────────────────┐
//!                    │               GUARD CHAIN                  │
//!                    │  security headers → CSRF → logging →       │
//!                    │  rate limiter (policies + counter store)   │
//!                    └─────────────────────┬─────────────────────┘
//!                                          │ forwarded
//!                                          ▼
//!                                   API handlers
//!
//!     Sweeper (background) ── evicts expired counter records every interval
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use api_guard::config::{loader, ConfigError, GuardConfig};
use api_guard::lifecycle::{signals, Shutdown};
use api_guard::observability::{logging, metrics};
use api_guard::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "api-guard", version, about = "Rate limiting and CSRF guard for the public API")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overriding configuration and GUARD_BIND
    #[arg(short, long)]
    bind: Option<String>,

    /// Allow the local development origin for mutating requests
    #[arg(long)]
    development: bool,
}

/// File (or defaults), then environment, then flags; validated last.
fn build_config<F>(args: &Args, env: F) -> Result<GuardConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => loader::read_config(path)?,
        None => GuardConfig::default(),
    };
    loader::apply_env_overrides(&mut config, env);

    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    if args.development {
        config.csrf.development = true;
    }
    loader::validated(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = build_config(&args, |key| std::env::var(key).ok())?;

    logging::init(&config.observability.log_level);
    tracing::info!("api-guard v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        api_prefix = %config.api_prefix,
        development = config.csrf.development,
        sweep_interval_secs = config.rate_limit.sweep_interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_shutdown = shutdown.subscribe();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        signal_shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_guard::config::validation::ValidationError;

    #[test]
    fn test_bind_flag_is_validated() {
        let args = Args::parse_from(["api-guard", "--bind", "nowhere"]);
        match build_config(&args, |_| None) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::BindAddress("nowhere".into())]);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_environment() {
        let args = Args::parse_from(["api-guard", "--bind", "127.0.0.1:7000", "--development"]);
        let config = build_config(&args, |key| match key {
            "GUARD_BIND" => Some("127.0.0.1:9000".into()),
            "APP_ENV" => Some("production".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:7000");
        assert!(config.csrf.development);
    }
}

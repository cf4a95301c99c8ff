//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration and apply environment overrides
//! - Resolve the backend target before anything is bound
//! - Start the optional metrics exporter
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{read_config, validate_config, ConfigError, ProxyConfig, ValidationError};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Errors that stop the proxy from starting or keep it from serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build the effective configuration.
///
/// Starts from the file at `path` (or defaults), overlays `lookup` for
/// `TARGET_URL` and `PORT`, then validates the result.
pub fn load<F>(path: Option<&Path>, lookup: F) -> Result<ProxyConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };
    config.apply_env(lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Start the proxy and serve until `shutdown` is triggered.
pub async fn start(config: ProxyConfig, shutdown: &Shutdown) -> Result<(), StartupError> {
    let server = HttpServer::new(config)?;

    let observability = server.config().observability.clone();
    if observability.metrics_enabled {
        let addr: SocketAddr = observability.metrics_address.parse().map_err(|_| {
            ConfigError::Validation(vec![ValidationError::InvalidMetricsAddress(
                observability.metrics_address.clone(),
            )])
        })?;
        metrics::init_metrics(addr)?;
    }

    let address = server.config().listener.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    tracing::info!(
        address = %address,
        target = %server.target(),
        "Listening for connections"
    );

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}

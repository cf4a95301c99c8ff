//! cors-proxy
//!
//! Reverse proxy that lets a browser talk to a backend that is neither
//! CORS-aware nor publicly reachable.
//!
//! ```text
//!   Browser ──▶ route table ──▶ preflight ──▶ normalizer ──▶ forwarder ──▶ Backend
//!                   │               │ OPTIONS                                  │
//!                   │ 404           └──▶ 200 + CORS headers                    │
//!   Browser ◀───────┴──────────────────── Access-Control-Allow-Origin: * ◀────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use cors_proxy::config::schema::{PORT_ENV, TARGET_URL_ENV};
use cors_proxy::config::ObservabilityConfig;
use cors_proxy::lifecycle::{self, startup, wait_for_signal, Shutdown};
use cors_proxy::observability::init_logging;

#[derive(Parser)]
#[command(name = "cors-proxy")]
#[command(about = "CORS-normalizing reverse proxy for a single backend", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend URL; falls back to the built-in backend when unset or empty.
    #[arg(long, env = TARGET_URL_ENV)]
    target: Option<String>,

    /// Port to listen on; 8080 when unset or empty.
    #[arg(short, long, env = PORT_ENV)]
    port: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match startup::load(cli.config.as_deref(), |key| match key {
        TARGET_URL_ENV => cli.target.clone(),
        PORT_ENV => cli.port.clone(),
        _ => None,
    }) {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("failed to initialize logging: {e}");
    }

    tracing::info!("cors-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let shutdown = Shutdown::new();
    shutdown.trigger_on(wait_for_signal());

    match lifecycle::start(config, &shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Proxy stopped with error");
            ExitCode::FAILURE
        }
    }
}

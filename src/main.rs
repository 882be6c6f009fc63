//! Library gateway
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                      GATEWAY                         │
//!   Client Request   │  ┌─────────┐   ┌──────────┐   ┌──────────────┐       │
//!  ──────────────────┼─▶│  http   │──▶│ handlers │──▶│ orchestrator │       │
//!                    │  │ server  │   │          │   │  use cases   │       │
//!                    │  └─────────┘   └──────────┘   └──────┬───────┘       │
//!                    │                                      │               │
//!                    │                 ┌────────────────────┼────────┐      │
//!                    │                 ▼                    ▼        ▼      │
//!                    │          ┌────────────┐      ┌──────────────────┐    │
//!                    │          │   retry    │─────▶│ BackendClient ×3 │────┼──▶ catalog
//!                    │          │ dispatcher │      │  + CallGate each │────┼──▶ reputation
//!                    │          └────────────┘      └──────────────────┘────┼──▶ booking
//!                    │                                                      │
//!                    │   config · observability · lifecycle                │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use library_gateway::config::{load_config, GatewayConfig};
use library_gateway::lifecycle::{spawn_signal_handler, Shutdown};
use library_gateway::observability::{logging, metrics};
use library_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "library-gateway")]
#[command(about = "API gateway for the library services", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "library-gateway starting");
    tracing::info!(
        config_file = ?cli.config,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_ms = config.timeouts.upstream_ms,
        retry_interval_secs = config.retry.interval_secs,
        "Configuration loaded"
    );

    if cli.check {
        tracing::info!("Configuration is valid");
        return Ok(());
    }

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

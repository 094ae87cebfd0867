//! LevPay API gateway.
//!
//! Forwards the payment API to one fixed upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                   GATEWAY                        │
//!                      │                                                  │
//!   Client Request     │  ┌──────────┐   ┌───────────┐   ┌────────────┐   │
//!   ───────────────────┼─▶│  layers  │──▶│ forwarder │──▶│  routing   │   │
//!                      │  │cors/id/  │   │ preflight │   │ allow-list │   │
//!                      │  │trace/limit│  └─────┬─────┘   │ + target   │   │
//!                      │  └──────────┘         │         └────────────┘   │
//!                      │                       ▼                          │
//!   Client Response    │  ┌──────────┐   ┌───────────┐                    │
//!   ◀──────────────────┼──│  relay   │◀──│  client   │◀───────────────────┼── Upstream
//!                      │  │bin/json/ │   │ deadline  │                    │
//!                      │  │  text    │   └───────────┘                    │
//!                      │  └──────────┘                                    │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use levpay_gateway::config::{load_config, validate_config, ConfigError, ProxyConfig};
use levpay_gateway::http::HttpServer;
use levpay_gateway::lifecycle::{signals, Shutdown};
use levpay_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "levpay-gateway")]
#[command(about = "API gateway forwarding the LevPay payment API to its backend", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Upstream base URL, overriding the config file.
    #[arg(short, long, env = "GATEWAY_UPSTREAM")]
    upstream: Option<String>,

    /// Bind address, overriding the config file.
    #[arg(short, long)]
    bind: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(upstream) = self.upstream {
            config.upstream.base_url = upstream;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability)?;
    tracing::info!("levpay-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        timeout_ms = config.upstream.timeout_ms,
        max_body_size = config.security.max_body_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

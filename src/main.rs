//! CORS relay (v1)
//!
//! A stateless forwarding proxy built with Tokio, Axum and reqwest.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                      CORS RELAY                      │
//!                   │                                                      │
//!  Client Request   │  ┌──────────┐   ┌─────────────┐   ┌──────────────┐   │
//!  ─────────────────┼─▶│  http    │──▶│  preflight  │──▶│ destination  │   │
//!                   │  │  server  │   │  (OPTIONS)  │   │  resolver    │   │
//!                   │  └──────────┘   └─────────────┘   └──────┬───────┘   │
//!                   │                                          ▼           │
//!                   │                                   ┌──────────────┐   │
//!                   │                                   │   request    │   │
//!                   │                                   │  translator  │   │
//!                   │                                   └──────┬───────┘   │
//!                   │                                          ▼           │
//!  Client Response  │  ┌──────────┐                     ┌──────────────┐   │
//!  ◀────────────────┼──│ response │◀────────────────────│   upstream   │◀──┼── Destination
//!                   │  │  relay   │                     │    client    │   │
//!                   │  └──────────┘                     └──────────────┘   │
//!                   └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use cors_relay::config::{self, ConfigError, DestinationMode, ProxyConfig};
use cors_relay::lifecycle::{signals, Shutdown};
use cors_relay::observability::{logging, metrics};
use cors_relay::{HttpClient, HttpServer, ProxyHandler};

#[derive(Parser)]
#[command(name = "cors-relay")]
#[command(about = "Forwarding proxy that adds CORS headers to any destination", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "CORS_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long, env = "CORS_RELAY_BIND")]
    bind: Option<String>,

    /// Override `cors.allowed_origin`.
    #[arg(long, env = "CORS_RELAY_ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,

    /// Override `destination.mode`.
    #[arg(long, value_enum, env = "CORS_RELAY_DESTINATION_MODE")]
    destination_mode: Option<DestinationMode>,
}

impl Cli {
    fn load(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(origin) = &self.allowed_origin {
            config.cors.allowed_origin = origin.clone();
        }
        if let Some(mode) = self.destination_mode {
            config.destination.mode = mode;
        }

        config::validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init(&config.observability);
    tracing::info!("cors-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        destination_mode = ?config.destination.mode,
        allowed_origin = %config.cors.allowed_origin,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let client = HttpClient::new(&config.timeouts, &config.forwarding)?;
    let handler = ProxyHandler::new(&config, Arc::new(client))?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::trigger_on_signal(shutdown));

    HttpServer::new(handler).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

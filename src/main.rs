//! Caching Forward Proxy
//!
//! A single-host forwarding HTTP/1.x proxy built with Tokio.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!                  │               FORWARD PROXY                   │
//!                  │                                               │
//!   Client ───────▶│  net::listener ──▶ proxy::worker              │
//!                  │   (permit +          │                        │
//!                  │    accept)           ▼                        │
//!                  │                 cache lookup ── hit ──▶ reply │
//!                  │                      │ miss                   │
//!                  │                      ▼                        │
//!                  │                 http::request parse           │
//!                  │                      │                        │
//!                  │                      ▼                        │
//!   Origin ◀──────┼───────────── forward + relay ────────────────▶│ Client
//!                  │                      │                        │
//!                  │                      ▼                        │
//!                  │                 cache insert                  │
//!                  └──────────────────────────────────────────────┘
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caching_proxy::config::{load_config, ProxyConfig};
use caching_proxy::net::BoundedListener;
use caching_proxy::proxy::ProxyServer;

#[derive(Debug, Parser)]
#[command(name = "caching-proxy", about = "A caching forward HTTP proxy")]
struct Args {
    /// Port to listen on.
    port: u16,

    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caching_proxy=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    tracing::info!(
        port = args.port,
        bind_host = %config.listener.bind_host,
        max_workers = config.listener.max_workers,
        cache_capacity_bytes = config.cache.capacity_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => caching_proxy::observability::metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_ip: IpAddr = config.listener.bind_host.parse()?;
    let addr = SocketAddr::new(bind_ip, args.port);
    let listener = BoundedListener::bind(addr, config.listener.max_workers).await?;

    let server = ProxyServer::new(config);
    tokio::select! {
        result = server.run(listener) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

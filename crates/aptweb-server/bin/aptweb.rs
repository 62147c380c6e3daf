//! aptweb binary entry point.
//!
//! This is a thin wrapper around the aptweb-server library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging
//! 3. Validates configuration
//! 4. Starts the server
//!
//! For library usage, see the aptweb-server crate documentation.

use anyhow::Result;
use aptweb_server::{Server, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from CLI args and APTWEB_* environment variables
    let config = ServerConfig::from_args();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("aptweb {} starting...", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        "Configuration loaded: HTTP={}, metrics={}, origin={}, feeds={}",
        config.http_bind,
        config.metrics_bind,
        config.dists_host,
        config.release_feeds.len()
    );

    config.validate()?;

    let server = Server::new(config)?;
    server.run().await?;

    Ok(())
}

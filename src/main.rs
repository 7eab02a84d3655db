//! Job-board request security gateway.
//!
//! Fronts the application's mutating and administrative routes with the
//! layered gatekeeping pipeline: rate limiting, origin validation, session
//! and role resolution, and the role-partitioned route tree.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use jobgate::auth::identity::InMemoryIdentityStore;
use jobgate::config::{load_config, GatewayConfig};
use jobgate::http::GatewayServer;
use jobgate::observability;

#[derive(Parser, Debug)]
#[command(name = "jobgate", about = "Job-board request security gateway")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    observability::logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "jobgate starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        policies = config.rate_limit.policies.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Production deployments replace this with the hosted identity
    // provider's adapter; the in-memory store serves local development.
    let identity = Arc::new(InMemoryIdentityStore::new());

    let server = GatewayServer::new(config, identity);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Gateway entry-point: loads settings, wires the backend client, the auth
//! gate and the REST endpoints, then serves until shutdown.

mod server;

use std::net::SocketAddr;

use actix_web::web;
use clap::Parser;
use mockable::DefaultEnv;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use gateway::inbound::http::gateway_config::{BuildMode, settings_from_env};
use gateway::inbound::http::health::HealthState;
use server::{ServerConfig, create_server};

/// Command-line overrides for the environment-driven settings.
#[derive(Debug, Parser)]
#[command(name = "gateway", about = "Practice backend gateway")]
struct Cli {
    /// Listen address; overrides `BIND_ADDR`.
    #[arg(long)]
    bind_addr: Option<SocketAddr>,
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let settings = settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(|e| std::io::Error::other(format!("invalid gateway configuration: {e}")))?;

    let mut config = ServerConfig::new(settings);
    if let Some(bind_addr) = cli.bind_addr {
        config = config.with_bind_addr(bind_addr);
    }
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(server::make_metrics()?));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    server.await
}

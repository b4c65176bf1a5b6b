//! RPS Duel Server
//!
//! Accepts WebSocket connections, pairs them two at a time and referees
//! their duels.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rps_duel::{GameServer, ServerConfig, CLASH_INTERVAL_MS, STARTING_HEALTH, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env().context("Failed to read configuration")?;

    info!("RPS Duel Server v{}", VERSION);
    info!(
        "Starting health: {} (default {}), forcing interval: {:?} (default {} ms)",
        config.session.starting_health, STARTING_HEALTH, config.session.clash_interval, CLASH_INTERVAL_MS
    );

    let server = GameServer::new(config);

    tokio::select! {
        result = server.run() => {
            result.context("Game server stopped")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            server.shutdown();
        }
    }

    Ok(())
}

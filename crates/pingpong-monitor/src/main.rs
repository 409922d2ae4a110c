//! Heartbeat monitor - entry point.
//!
//! Connects a heartbeat session to the configured gateway and logs every
//! status change and statistics update until Ctrl-C.

use anyhow::Result;
use clap::Parser;
use pingpong_session::HeartbeatSession;
use tracing::info;

/// Heartbeat liveness monitor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PINGPONG_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    pingpong_session::init_crypto();

    let args = Args::parse();

    pingpong_monitor::init_logging()?;

    info!("Starting heartbeat monitor v{}", env!("CARGO_PKG_VERSION"));

    // Determine config path: CLI arg > PINGPONG_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("PINGPONG_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let config = pingpong_monitor::AppConfig::from_file(&config_path)?;
    info!(endpoint = %config.endpoint, user_id = %config.user_id, "Configuration loaded");

    let session = HeartbeatSession::new(config.session_config());

    session.on_connection_status_change(|status| {
        info!(
            connected = status.is_connected,
            quality = %status.quality,
            latency_ms = status.latency_ms,
            "connection status changed"
        );
    });
    session.on_stats_update(|stats| {
        info!(
            total_pings = stats.total_pings,
            total_pongs = stats.total_pongs,
            average_latency_ms = stats.average_latency_ms,
            uptime_ms = stats.connection_uptime_ms,
            "heartbeat stats"
        );
    });

    session.connect(config.identity())?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    session.disconnect();

    Ok(())
}

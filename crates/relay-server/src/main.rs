//! WebSocket relay server binary.

use relay_server::config::Config;
use relay_server::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    tracing::info!(
        addr = %config.socket_addr_string(),
        max_clients = config.max_clients,
        outbound_buffer = config.outbound_buffer,
        event_queue = config.event_queue,
        "Starting relay-server"
    );

    server::run(config).await
}

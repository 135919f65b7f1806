//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Listens on the configured address/port.
//! - Accepts new TCP connections, up to `max_clients` at a time.
//! - Assigns each connection a `ConnectionId`.
//! - Spawns:
//!   - a per-client task to handle the WebSocket,
//!   - a single central relay task that owns the registry.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use relay_core::ConnectionId;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use crate::client;
use crate::config::Config;
use crate::relay_task;
use crate::types::{RelayRx, RelayTx};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

fn next_connection_id() -> ConnectionId {
    ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.socket_addr_string()).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    serve(listener, config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Accept connections on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, config: Config, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let (relay_tx, relay_rx): (RelayTx, RelayRx) = mpsc::channel(config.event_queue);
    tokio::spawn(relay_task::run_relay_loop(relay_rx));

    let slots = Arc::new(Semaphore::new(config.max_clients));
    tokio::pin!(shutdown);

    loop {
        let (stream, peer_addr) = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    continue;
                }
            },
        };

        let Ok(permit) = slots.clone().try_acquire_owned() else {
            warn!(
                peer = %peer_addr,
                max_clients = config.max_clients,
                "Rejecting connection: max_clients reached"
            );
            // Just drop the stream; client will see the connection close.
            continue;
        };

        let id = next_connection_id();
        info!(conn_id = %id, peer = %peer_addr, "Accepted connection");

        let relay_tx = relay_tx.clone();
        let outbound_buffer = config.outbound_buffer;
        let handshake_timeout = config.handshake_timeout;
        tokio::spawn(async move {
            if let Err(e) =
                client::run_client(id, stream, relay_tx, outbound_buffer, handshake_timeout).await
            {
                warn!(conn_id = %id, error = %e, "Client error");
            }
            drop(permit);
        });
    }

    Ok(())
}

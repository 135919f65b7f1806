//! Per-connection task.
//!
//! Performs the WebSocket handshake (bounded by a timeout), registers the
//! connection with the relay task, then splits the socket:
//! - writer task: drains the bounded outbound queue into the sink
//! - reader loop: forwards data frames to the relay task
//!
//! When the reader loop ends the relay task is told why (close or error)
//! and drops its handle, which in turn ends the writer.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use relay_core::ConnectionId;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::types::{ClientHandle, OutboundRx, OutboundTx, RelayEvent, RelayTx};

/// Run the client I/O loop for a single connection.
pub async fn run_client(
    id: ConnectionId,
    stream: TcpStream,
    relay_tx: RelayTx,
    outbound_buffer: usize,
    handshake_timeout: Duration,
) -> anyhow::Result<()> {
    let handshake = tokio_tungstenite::accept_async(stream);
    let ws_stream = match tokio::time::timeout(handshake_timeout, handshake).await {
        Ok(result) => result?,
        Err(_) => anyhow::bail!("WebSocket handshake timed out after {:?}", handshake_timeout),
    };
    let (mut ws_sink, mut ws_source) = ws_stream.split();

    let (out_tx, mut out_rx): (OutboundTx, OutboundRx) = mpsc::channel(outbound_buffer);

    if relay_tx
        .send(RelayEvent::Opened(ClientHandle { id, tx: out_tx }))
        .await
        .is_err()
    {
        warn!(conn_id = %id, "Relay channel closed, dropping connection");
        return Ok(());
    }

    // Writer task: consume queued frames and write them to the socket.
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if let Err(e) = ws_sink.send(msg).await {
                debug!(conn_id = %id, error = %e, "Write failed");
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    let last_event = loop {
        match ws_source.next().await {
            Some(Ok(Message::Text(text))) => {
                if relay_tx.send(RelayEvent::Text { id, text }).await.is_err() {
                    break None;
                }
            }
            Some(Ok(Message::Binary(data))) => {
                if relay_tx.send(RelayEvent::Binary { id, data }).await.is_err() {
                    break None;
                }
            }
            Some(Ok(Message::Close(frame))) => {
                debug!(conn_id = %id, frame = ?frame, "Client initiated close");
                break Some(RelayEvent::Closed { id });
            }
            // Ping/Pong are answered by the WebSocket layer.
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                break Some(RelayEvent::Errored {
                    id,
                    error: e.to_string(),
                });
            }
            None => break Some(RelayEvent::Closed { id }),
        }
    };

    match last_event {
        Some(event) => {
            let _ = relay_tx.send(event).await;
        }
        None => warn!(conn_id = %id, "Relay channel closed"),
    }

    let _ = writer_handle.await;
    info!(conn_id = %id, "Client task finished");
    Ok(())
}

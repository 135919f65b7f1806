//! Central relay loop.
//!
//! This task owns the `Relay` instance (and with it the registry) and
//! processes every `RelayEvent` coming from client tasks. Because only
//! this task touches the registry, no lock is needed, and frames from
//! one connection are handled in the order the client task read them.

use relay_core::Relay;
use tracing::{debug, info};

use crate::types::{ClientHandle, RelayEvent, RelayRx};

/// Run the central relay processing loop until every sender is dropped.
pub async fn run_relay_loop(mut relay_rx: RelayRx) {
    let mut relay: Relay<ClientHandle> = Relay::new();

    while let Some(event) = relay_rx.recv().await {
        handle_event(&mut relay, event);
    }

    info!("Relay loop shutting down (relay_rx closed)");
}

fn handle_event(relay: &mut Relay<ClientHandle>, event: RelayEvent) {
    match event {
        RelayEvent::Opened(handle) => relay.handle_connect(handle),
        RelayEvent::Text { id, text } => {
            let outcome = relay.on_frame(id, &text);
            debug!(conn_id = %id, outcome = ?outcome, "Text frame processed");
        }
        RelayEvent::Binary { id, data } => {
            let outcome = relay.on_binary_frame(id, &data);
            debug!(conn_id = %id, outcome = ?outcome, "Binary frame processed");
        }
        RelayEvent::Closed { id } => {
            relay.on_close(id);
        }
        RelayEvent::Errored { id, error } => {
            relay.on_error(id, &error);
        }
    }
}

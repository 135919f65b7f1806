//! End-to-end tests: real sockets, real WebSocket handshakes.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use relay_protocol::{encode_chat, encode_connect};
use relay_server::config::Config;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Time for the relay task to process frames that crossed different sockets.
const SETTLE: Duration = Duration::from_millis(100);

/// How long "nothing arrives" assertions wait.
const QUIET: Duration = Duration::from_millis(300);

/// Helper: start the server on a random port and return its address plus
/// a trigger that stops the accept loop.
async fn start_test_server(config: Config) -> (SocketAddr, oneshot::Sender<()>) {
    let (addr, stop_tx, _server) = spawn_server(config).await;
    (addr, stop_tx)
}

/// Like `start_test_server`, but also hands back the `serve` task.
async fn spawn_server(config: Config) -> (SocketAddr, oneshot::Sender<()>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        relay_server::server::serve(listener, config, async {
            let _ = stop_rx.await;
        })
        .await
        .unwrap();
    });

    (addr, stop_tx, server)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("WebSocket handshake failed");
    ws
}

async fn identify(ws: &mut Client, user_id: &str) {
    ws.send(Message::text(encode_connect(user_id))).await.unwrap();
}

async fn send_chat(ws: &mut Client, to: &str, message: Value) {
    ws.send(Message::text(encode_chat(to, &message))).await.unwrap();
}

/// Next data frame as JSON, or `None` if nothing arrives within `QUIET`.
async fn next_json(ws: &mut Client) -> Option<Value> {
    loop {
        match tokio::time::timeout(QUIET, ws.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => {
                return Some(serde_json::from_str(&text).expect("relay sent invalid JSON"))
            }
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => continue,
            _ => return None,
        }
    }
}

#[tokio::test]
async fn delivers_to_recipient_then_stops_after_close() {
    let (addr, _stop) = start_test_server(Config::default()).await;

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    identify(&mut a, "u1").await;
    identify(&mut b, "u2").await;
    tokio::time::sleep(SETTLE).await;

    send_chat(&mut a, "u2", json!({ "text": "hello" })).await;
    assert_eq!(next_json(&mut b).await, Some(json!({ "text": "hello" })));
    assert_eq!(next_json(&mut a).await, None, "sender must not get anything back");

    b.close(None).await.unwrap();
    tokio::time::sleep(SETTLE).await;

    send_chat(&mut a, "u2", json!({ "text": "again" })).await;
    assert_eq!(next_json(&mut a).await, None);

    // A's connection is still usable.
    let mut c = connect(addr).await;
    identify(&mut c, "u3").await;
    tokio::time::sleep(SETTLE).await;
    send_chat(&mut a, "u3", json!("still here")).await;
    assert_eq!(next_json(&mut c).await, Some(json!("still here")));
}

#[tokio::test]
async fn offline_recipient_and_garbage_do_not_break_sender() {
    let (addr, _stop) = start_test_server(Config::default()).await;

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    identify(&mut a, "alice").await;
    identify(&mut b, "bob").await;

    a.send(Message::text("{not json")).await.unwrap();
    a.send(Message::text(r#"{"type":"typing"}"#)).await.unwrap();
    send_chat(&mut a, "nobody", json!("hi")).await;
    tokio::time::sleep(SETTLE).await;

    assert_eq!(next_json(&mut b).await, None);

    send_chat(&mut a, "bob", json!("hi")).await;
    assert_eq!(next_json(&mut b).await, Some(json!("hi")));
}

#[tokio::test]
async fn reconnect_wins_over_late_close() {
    let (addr, _stop) = start_test_server(Config::default()).await;

    let mut sender = connect(addr).await;
    let mut old = connect(addr).await;
    let mut new = connect(addr).await;
    identify(&mut sender, "bob").await;
    identify(&mut old, "alice").await;
    tokio::time::sleep(SETTLE).await;
    identify(&mut new, "alice").await;
    tokio::time::sleep(SETTLE).await;

    old.close(None).await.unwrap();
    tokio::time::sleep(SETTLE).await;

    send_chat(&mut sender, "alice", json!("which one?")).await;
    assert_eq!(next_json(&mut new).await, Some(json!("which one?")));
}

#[tokio::test]
async fn binary_frames_are_read_as_json() {
    let (addr, _stop) = start_test_server(Config::default()).await;

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    a.send(Message::binary(encode_connect("alice").into_bytes()))
        .await
        .unwrap();
    identify(&mut b, "bob").await;
    tokio::time::sleep(SETTLE).await;

    b.send(Message::binary(encode_chat("alice", &json!([1, 2, 3])).into_bytes()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut a).await, Some(json!([1, 2, 3])));
}

#[tokio::test]
async fn connections_over_the_limit_are_refused() {
    let config = Config {
        max_clients: 1,
        ..Config::default()
    };
    let (addr, _stop) = start_test_server(config).await;

    let _first = connect(addr).await;
    let second = tokio_tungstenite::connect_async(format!("ws://{addr}")).await;
    assert!(second.is_err());
}

#[tokio::test]
async fn shutdown_stops_accepting() {
    let (addr, stop_tx, server) = spawn_server(Config::default()).await;

    let mut a = connect(addr).await;
    identify(&mut a, "alice").await;

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(2), server)
        .await
        .expect("serve did not return after shutdown")
        .unwrap();

    let late = tokio_tungstenite::connect_async(format!("ws://{addr}")).await;
    assert!(late.is_err(), "listener should be closed after shutdown");
}

#[tokio::test]
async fn stalled_handshake_releases_its_slot() {
    let config = Config {
        max_clients: 1,
        handshake_timeout: Duration::from_millis(200),
        ..Config::default()
    };
    let (addr, _stop) = start_test_server(config).await;

    // Plain TCP, never upgraded: holds the only slot until the timeout.
    let _idle = TcpStream::connect(addr).await.unwrap();
    tokio::time::sleep(SETTLE).await;
    assert!(tokio_tungstenite::connect_async(format!("ws://{addr}")).await.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;

    let mut a = connect(addr).await;
    identify(&mut a, "alice").await;
}

#[tokio::test]
async fn flooding_sender_still_delivers_through_small_event_queue() {
    let config = Config {
        event_queue: 2,
        ..Config::default()
    };
    let (addr, _stop) = start_test_server(config).await;

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    identify(&mut a, "alice").await;
    identify(&mut b, "bob").await;
    tokio::time::sleep(SETTLE).await;

    for _ in 0..500 {
        a.send(Message::text("{not json")).await.unwrap();
    }
    send_chat(&mut a, "bob", json!("after the flood")).await;

    let frame = tokio::time::timeout(Duration::from_secs(5), b.next())
        .await
        .expect("message never arrived");
    match frame {
        Some(Ok(Message::Text(text))) => {
            let received: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(received, json!("after the flood"));
        }
        other => panic!("unexpected frame: {other:?}"),
    }
}

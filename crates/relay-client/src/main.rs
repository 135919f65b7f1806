// crates/relay-client/src/main.rs

mod command;

use anyhow::Result;
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use relay_protocol::{encode_chat, encode_connect};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::command::parse_line;

#[derive(Parser)]
#[clap(name = "relay-client")]
#[clap(about = "Chat over the realtime relay from a terminal")]
struct Cli {
    /// Relay WebSocket URL
    #[clap(short, long, default_value = "ws://127.0.0.1:3000")]
    server: String,

    /// User id announced in the connect frame
    #[clap(short, long)]
    user_id: String,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    info!("Connecting to {}...", cli.server);
    let (ws_stream, _) = tokio_tungstenite::connect_async(cli.server.as_str()).await?;
    let (mut ws_sink, mut ws_source) = ws_stream.split();

    ws_sink
        .send(Message::text(encode_connect(&cli.user_id)))
        .await?;
    info!(user_id = %cli.user_id, "Connected");
    eprintln!("Type `<receiverId> <message>` and press enter. Ctrl-D quits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Some(cmd) => {
                        let frame = encode_chat(&cmd.receiver_id, &cmd.message);
                        debug!("Sending {}", frame);
                        ws_sink.send(Message::text(frame)).await?;
                    }
                    None if line.trim().is_empty() => {}
                    None => eprintln!("usage: <receiverId> <message>"),
                }
            }

            frame = ws_source.next() => match frame {
                Some(Ok(Message::Text(text))) => println!("<< {}", text),
                Some(Ok(Message::Binary(data))) => println!("<< {}", String::from_utf8_lossy(&data)),
                Some(Ok(Message::Close(_))) | None => {
                    info!("Relay closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            },
        }
    }

    let _ = ws_sink.close().await;
    Ok(())
}

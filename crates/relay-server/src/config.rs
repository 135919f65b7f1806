//! Configuration for the relay server.
//!
//! Defaults can be overridden via environment variables:
//!
//! - `RELAY_BIND_ADDR`       (default: "0.0.0.0")
//! - `RELAY_PORT`            (default: "3000")
//! - `RELAY_MAX_CLIENTS`     (default: "1024")
//! - `RELAY_OUTBOUND_BUFFER` (default: "256")
//! - `RELAY_EVENT_QUEUE`     (default: "1024")
//! - `RELAY_HANDSHAKE_TIMEOUT_MS` (default: "10000")

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Maximum number of simultaneously connected sockets.
    pub max_clients: usize,

    /// Per-connection outbound queue capacity. Messages for a recipient
    /// whose queue is full are dropped.
    pub outbound_buffer: usize,

    /// Capacity of the queue from client tasks to the relay task. A client
    /// whose frames cannot be queued stops being read until there is room.
    pub event_queue: usize,

    /// How long an accepted socket may take to complete the WebSocket
    /// upgrade before it is dropped and its slot released.
    pub handshake_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 3000,
            max_clients: 1024,
            outbound_buffer: 256,
            event_queue: 1024,
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let bind_addr = lookup("RELAY_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port = read_or_default(&lookup, "RELAY_PORT", defaults.port)?;
        let max_clients = read_or_default(&lookup, "RELAY_MAX_CLIENTS", defaults.max_clients)?;
        let outbound_buffer =
            read_or_default(&lookup, "RELAY_OUTBOUND_BUFFER", defaults.outbound_buffer)?;
        let event_queue = read_or_default(&lookup, "RELAY_EVENT_QUEUE", defaults.event_queue)?;
        let handshake_timeout_ms = read_or_default(
            &lookup,
            "RELAY_HANDSHAKE_TIMEOUT_MS",
            defaults.handshake_timeout.as_millis() as u64,
        )?;

        for (key, value) in [
            ("RELAY_MAX_CLIENTS", max_clients as u64),
            ("RELAY_OUTBOUND_BUFFER", outbound_buffer as u64),
            ("RELAY_EVENT_QUEUE", event_queue as u64),
            ("RELAY_HANDSHAKE_TIMEOUT_MS", handshake_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { key });
            }
        }

        Ok(Config {
            bind_addr,
            port,
            max_clients,
            outbound_buffer,
            event_queue,
            handshake_timeout: Duration::from_millis(handshake_timeout_ms),
        })
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn read_or_default<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

//! SOA forum gateway — entry point.
//!
//! This binary accepts WebSocket connections from the forum's browser
//! screens and relays each inbound command to the downstream SOA bus over a
//! fresh framed TCP exchange, writing the raw bus reply back to the session
//! that asked.
//!
//! # Why a separate gateway process?
//!
//! Browsers cannot open raw TCP sockets, and the bus speaks a length-prefixed
//! TCP protocol. The gateway is the one process that knows both transports;
//! it adds the `{len:05}` frame on the way in and nothing on the way out.
//!
//! # Usage
//!
//! ```text
//! soa-gateway [OPTIONS]
//!
//! Options:
//!   --ws-port <PORT>              WebSocket listener port [default: 3001]
//!   --ws-bind <ADDR>              WebSocket bind address [default: 0.0.0.0]
//!   --bus-host <HOST>             Bus hostname or IP [default: 127.0.0.1]
//!   --bus-port <PORT>             Bus TCP port [default: 8000]
//!   --bus-connect-timeout <SECS>  Bus connect timeout [default: 5]
//!   --max-in-flight <N>           Concurrent bus exchange cap [default: 256]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                  | Default     |
//! |---------------------------|-------------|
//! | `SOA_WS_PORT`             | `3001`      |
//! | `SOA_WS_BIND`             | `0.0.0.0`   |
//! | `SOA_BUS_HOST`            | `127.0.0.1` |
//! | `SOA_BUS_PORT`            | `8000`      |
//! | `SOA_BUS_CONNECT_TIMEOUT` | `5`         |
//! | `SOA_MAX_IN_FLIGHT`       | `256`       |

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use soa_gateway::domain::GatewayConfig;
use soa_gateway::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// SOA forum WebSocket-to-bus gateway.
#[derive(Debug, Parser)]
#[command(
    name = "soa-gateway",
    about = "WebSocket-to-bus gateway for the SOA forum",
    version
)]
struct Cli {
    /// TCP port for the WebSocket server to listen on.
    #[arg(long, default_value_t = 3001, env = "SOA_WS_PORT")]
    ws_port: u16,

    /// IP address to bind the WebSocket server to.
    #[arg(long, default_value = "0.0.0.0", env = "SOA_WS_BIND")]
    ws_bind: String,

    /// Hostname or IP address of the downstream bus.
    #[arg(long, default_value = "127.0.0.1", env = "SOA_BUS_HOST")]
    bus_host: String,

    /// TCP port of the downstream bus.
    #[arg(long, default_value_t = 8000, env = "SOA_BUS_PORT")]
    bus_port: u16,

    /// Bus connect timeout in seconds.
    #[arg(long, default_value_t = 5, env = "SOA_BUS_CONNECT_TIMEOUT")]
    bus_connect_timeout: u64,

    /// Maximum concurrent in-flight bus exchanges.
    #[arg(long, default_value_t = 256, env = "SOA_MAX_IN_FLIGHT")]
    max_in_flight: usize,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`GatewayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--ws-bind` or `--bus-host` is not a valid IP
    /// address.
    fn into_gateway_config(self) -> anyhow::Result<GatewayConfig> {
        let ws_bind_addr: SocketAddr = format!("{}:{}", self.ws_bind, self.ws_port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid WebSocket bind address: '{}:{}'",
                    self.ws_bind, self.ws_port
                )
            })?;

        let bus_addr: SocketAddr = format!("{}:{}", self.bus_host, self.bus_port)
            .parse()
            .with_context(|| {
                format!("invalid bus address: '{}:{}'", self.bus_host, self.bus_port)
            })?;

        Ok(GatewayConfig {
            ws_bind_addr,
            bus_addr,
            bus_connect_timeout: Duration::from_secs(self.bus_connect_timeout),
            max_in_flight: self.max_in_flight,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log level comes from RUST_LOG; fall back to info.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.into_gateway_config()?;

    info!(
        "SOA gateway starting — ws={}, bus={}",
        config.ws_bind_addr, config.bus_addr
    );

    // Graceful shutdown: Ctrl+C clears the flag, the accept loop notices
    // within 200 ms and exits.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("SOA gateway stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! One-shot TCP exchanges against the downstream bus.
//!
//! Every relayed request performs exactly one exchange: open a fresh
//! connection, write the length-prefixed frame, accumulate the reply until
//! the bus closes the connection, and hand the bytes back. The connection is
//! never reused and the reply is never parsed — the bus signals end-of-reply
//! with EOF, not with a frame of its own.
//!
//! One connection per call is deliberate: with no concurrent traffic on a
//! connection there is no way for two replies to interleave, so one logical
//! request always yields exactly one complete logical reply. The cost is a
//! TCP handshake per request.

use std::net::SocketAddr;
use std::time::Duration;

use soa_core::protocol::framing::{encode_frame, FramingError};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Errors that can occur during a bus exchange.
///
/// Callers do not see these directly over the wire: the application layer
/// folds them into the fixed error tokens before anything reaches a client.
#[derive(Debug, Error)]
pub enum BusError {
    /// The command could not be framed (too large for the length prefix).
    /// The request never left the gateway.
    #[error("command cannot be framed: {0}")]
    Encode(#[from] FramingError),

    /// The bus connection could not be established or failed mid-exchange.
    #[error("bus unavailable: {0}")]
    Unavailable(#[source] std::io::Error),

    /// The bus did not accept the connection within the configured timeout.
    #[error("bus connect timed out after {0:?}")]
    ConnectTimeout(Duration),
}

/// Performs one request/reply exchange: frame, connect, write, read-to-EOF.
///
/// The returned bytes are whatever the bus chose to send, unmodified. There
/// is no retry on failure.
///
/// # Errors
///
/// Returns [`BusError::Encode`] if the command exceeds the frame limit and
/// [`BusError::Unavailable`] / [`BusError::ConnectTimeout`] for transport
/// faults.
pub async fn call_bus(
    bus_addr: SocketAddr,
    connect_timeout: Duration,
    command: &str,
) -> Result<Vec<u8>, BusError> {
    // Frame first: an unframeable command must fail before any connection
    // is opened.
    let frame = encode_frame(command.as_bytes())?;

    let mut stream = timeout(connect_timeout, TcpStream::connect(bus_addr))
        .await
        .map_err(|_| BusError::ConnectTimeout(connect_timeout))?
        .map_err(BusError::Unavailable)?;

    stream.write_all(&frame).await.map_err(BusError::Unavailable)?;

    // The reply is stream-until-close: accumulate everything until the bus
    // closes the connection. No length prefix is parsed on this side.
    let mut reply = Vec::with_capacity(1024);
    stream
        .read_to_end(&mut reply)
        .await
        .map_err(BusError::Unavailable)?;

    debug!(
        "bus exchange complete: sent {} bytes, received {} bytes",
        frame.len(),
        reply.len()
    );
    Ok(reply)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! WebSocket server: accept loop and per-session relay tasks.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming connections and upgrading each to a WebSocket
//!    session.
//! 3. For every inbound text message, dispatching an independent bus
//!    exchange and writing the reply back to the *same* session.
//! 4. Shutting down cleanly when the `running` flag is cleared.
//!
//! # Ordering
//!
//! Requests on one session are dispatched concurrently, each in its own
//! task, and replies are written in **backend-completion order** — not in
//! client-send order. A client that sends B before A's reply has arrived may
//! see B's reply first. The client-side correlator sidesteps this by keeping
//! at most one correlated request outstanding per connection.
//!
//! # Scalability
//!
//! Each session runs in its own Tokio task, and each in-flight bus exchange
//! in another, so one slow bus call never blocks a session's read loop and
//! one slow session never blocks the accept loop. The total number of
//! concurrent bus exchanges is capped by a semaphore
//! (`GatewayConfig::max_in_flight`) because every exchange consumes a fresh
//! bus connection.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::reply_bytes;
use crate::domain::GatewayConfig;
use crate::infrastructure::bus_client::call_bus;

// ── Public API ────────────────────────────────────────────────────────────────

/// Runs the main WebSocket accept loop until `running` is set to `false`.
///
/// Binds a TCP listener on `config.ws_bind_addr` and delegates to
/// [`run_on_listener`].
///
/// # Errors
///
/// Returns an error if the listener cannot be bound (port in use, missing
/// permission).
pub async fn run_server(config: GatewayConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.ws_bind_addr)
        .await
        .with_context(|| {
            format!(
                "failed to bind WebSocket listener on {}",
                config.ws_bind_addr
            )
        })?;

    info!("gateway listening on {}", config.ws_bind_addr);
    run_on_listener(listener, config, running).await
}

/// Accept loop over an already-bound listener.
///
/// Split out from [`run_server`] so tests can bind port 0, learn the actual
/// address, and drive the loop themselves.
pub async fn run_on_listener(
    listener: TcpListener,
    config: GatewayConfig,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let config = Arc::new(config);
    // One permit per concurrent bus exchange, shared by all sessions.
    let in_flight = Arc::new(Semaphore::new(config.max_in_flight));

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // A short timeout on accept() lets the loop re-check the running
        // flag even when no clients are connecting.
        let accept_result = timeout(Duration::from_millis(200), listener.accept()).await;

        match accept_result {
            Ok(Ok((stream, peer_addr))) => {
                info!("new client connection from {peer_addr}");
                let cfg = Arc::clone(&config);
                let permits = Arc::clone(&in_flight);
                tokio::spawn(async move {
                    handle_client_session(stream, peer_addr, cfg, permits).await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept error; keep serving other clients.
                error!("accept error: {e}");
            }
            Err(_) => {
                // Timeout — no new connection in the last 200 ms.
            }
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Top-level handler for one client session; wraps [`run_session`] and logs
/// the outcome so `?` stays usable inside.
async fn handle_client_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<GatewayConfig>,
    permits: Arc<Semaphore>,
) {
    match run_session(raw_stream, peer_addr, config, permits).await {
        Ok(()) => info!("session {peer_addr} closed normally"),
        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
    }
}

/// Runs the complete lifecycle of one client session.
///
/// Completes the WebSocket handshake, then reads messages until the client
/// disconnects. Each message is handed to a dispatch task; the session's
/// write half lives behind an `Arc<Mutex>` so those tasks can deliver
/// replies whenever their bus exchange completes.
///
/// When the client disconnects, this function returns and the session's
/// sink is dropped as the remaining dispatch tasks finish; their late
/// replies fail to send and are discarded, which is the intended behavior.
async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<GatewayConfig>,
    permits: Arc<Semaphore>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    info!("client session established: {peer_addr}");

    // Shared write half: the reply of any in-flight exchange goes back to
    // this session, whichever task finishes first.
    let (ws_tx, mut ws_rx) = ws_stream.split();
    let ws_tx = Arc::new(tokio::sync::Mutex::new(ws_tx));

    let session_id = peer_addr.to_string();

    loop {
        let ws_msg = match ws_rx.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("session {session_id}: client WebSocket closed normally");
                break;
            }
            Some(Err(e)) => {
                warn!("session {session_id}: client WebSocket error: {e}");
                break;
            }
            None => {
                debug!("session {session_id}: client stream ended");
                break;
            }
        };

        let raw = match ws_msg {
            WsMessage::Text(text) => text,
            WsMessage::Binary(bytes) => {
                // The client protocol is text; accept binary frames that are
                // valid UTF-8 and skip the rest.
                match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        warn!("session {session_id}: non-UTF-8 binary frame (ignored)");
                        continue;
                    }
                }
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) => {
                // Protocol-level keepalive; tungstenite answers pings itself.
                continue;
            }
            WsMessage::Close(_) => {
                debug!("session {session_id}: WebSocket Close frame received");
                break;
            }
            WsMessage::Frame(_) => {
                debug!("session {session_id}: raw frame (ignored)");
                continue;
            }
        };

        dispatch_request(raw, &session_id, &config, &permits, &ws_tx);
    }

    Ok(())
}

/// Type alias for the shared session write half.
type SharedSink = Arc<
    tokio::sync::Mutex<
        futures_util::stream::SplitSink<
            tokio_tungstenite::WebSocketStream<TcpStream>,
            WsMessage,
        >,
    >,
>;

/// Spawns the independent dispatch task for one inbound message.
///
/// The raw text is treated as a command verbatim — no validation, no
/// rewriting beyond the framing the bus client applies. Whatever comes back
/// (bus bytes or an error token) is written to the originating session.
fn dispatch_request(
    raw: String,
    session_id: &str,
    config: &Arc<GatewayConfig>,
    permits: &Arc<Semaphore>,
    ws_tx: &SharedSink,
) {
    let session_id = session_id.to_string();
    let cfg = Arc::clone(config);
    let permits = Arc::clone(permits);
    let sink = Arc::clone(ws_tx);

    tokio::spawn(async move {
        let request_id = Uuid::new_v4();
        // Log the tag and size, not the command: argument values include
        // credentials and message bodies.
        debug!(
            "session {session_id}: request {request_id}: tag={:?} ({} bytes)",
            raw.get(..5).unwrap_or(&raw),
            raw.len()
        );

        // Closed only if the semaphore itself is closed, which never
        // happens here; treat it as shutdown.
        let _permit = match permits.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let result = call_bus(cfg.bus_addr, cfg.bus_connect_timeout, &raw).await;
        if let Err(e) = &result {
            warn!("session {session_id}: request {request_id}: {e}");
        }
        let reply = reply_bytes(result);

        // The bus speaks text; tolerate stray non-UTF-8 bytes rather than
        // dropping the reply.
        let reply_text = String::from_utf8_lossy(&reply).into_owned();

        let mut sink = sink.lock().await;
        if sink.send(WsMessage::Text(reply_text)).await.is_err() {
            // Client went away while the exchange was in flight; the reply
            // is simply discarded.
            debug!("session {session_id}: request {request_id}: client gone, reply dropped");
        }
    });
}

//! WebSocket connection to the gateway.
//!
//! Architecture:
//! - `GatewayConnection` owns the write half of one WebSocket connection
//!   behind a mutex, plus the [`Correlator`] for that connection.
//! - A spawned reader task drains the read half, hands every inbound text
//!   line to the correlator, and forwards unconsumed lines (pushes) on an
//!   `mpsc` channel returned from [`GatewayConnection::connect`].
//! - [`send_and_await`](GatewayConnection::send_and_await) is the raw
//!   correlated exchange; [`request`](GatewayConnection::request) layers the
//!   command grammar and reply-envelope parsing from `soa-core` on top.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use soa_core::protocol::tokens;
use soa_core::{Command, Reply};

use crate::application::Correlator;

/// Errors surfaced by the client connection.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The WebSocket handshake with the gateway failed.
    #[error("failed to connect to gateway at {url}: {source}")]
    ConnectFailed {
        url: String,
        #[source]
        source: WsError,
    },
    /// Sending on the established connection failed.
    #[error("websocket transport error: {0}")]
    Transport(#[from] WsError),
    /// The connection went away while a reply was awaited.
    #[error("connection to gateway closed")]
    ConnectionClosed,
    /// No reply arrived within the configured window.
    #[error("no reply within {0:?}")]
    ReplyTimeout(Duration),
    /// The gateway reported the bus unreachable (`ERROR_TCP`).
    #[error("bus unavailable")]
    BusUnavailable,
    /// The gateway rejected the command before it reached the bus
    /// (`ERROR_FORMATO`).
    #[error("command rejected as malformed")]
    MalformedCommand,
    /// The reply line carries no `{tag}OK`/`{tag}NK` marker. The raw line
    /// is kept so the caller can still show it.
    #[error("reply carries no {tag}OK/{tag}NK marker: {line:?}")]
    UnrecognizedReply { tag: String, line: String },
}

/// Configuration for a gateway connection.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket URL of the gateway.
    pub gateway_url: String,
    /// How long [`GatewayConnection::send_and_await`] waits for a reply
    /// before abandoning its correlation entry.
    pub reply_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: "ws://127.0.0.1:3001".to_string(),
            reply_timeout: Duration::from_secs(10),
        }
    }
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// One correlated WebSocket connection to the gateway.
pub struct GatewayConnection {
    ws_tx: Arc<Mutex<WsSink>>,
    correlator: Arc<Correlator>,
    reply_timeout: Duration,
}

impl GatewayConnection {
    /// Connects to the gateway and starts the reader task.
    ///
    /// Returns the connection plus the push channel: every inbound line
    /// that arrives while no request is outstanding (notifications, event
    /// broadcasts) is delivered there. The channel ends when the gateway
    /// closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectFailed`] when the WebSocket handshake
    /// does not complete.
    pub async fn connect(
        config: ClientConfig,
    ) -> Result<(Self, mpsc::Receiver<String>), ClientError> {
        let (ws_stream, _) =
            connect_async(&config.gateway_url)
                .await
                .map_err(|e| ClientError::ConnectFailed {
                    url: config.gateway_url.clone(),
                    source: e,
                })?;

        info!("connected to gateway at {}", config.gateway_url);

        let (ws_tx, ws_rx) = ws_stream.split();
        let correlator = Arc::new(Correlator::new());
        let (push_tx, push_rx) = mpsc::channel(128);

        tokio::spawn(read_loop(ws_rx, Arc::clone(&correlator), push_tx));

        Ok((
            Self {
                ws_tx: Arc::new(Mutex::new(ws_tx)),
                correlator,
                reply_timeout: config.reply_timeout,
            },
            push_rx,
        ))
    }

    /// Sends one raw command line and awaits the next correlated reply.
    ///
    /// The one-shot waiter is installed *before* the send so a fast reply
    /// cannot slip past it to the push channel. On timeout the waiter is
    /// abandoned and the default handler restored; a reply that races the
    /// abandon is still returned rather than lost.
    ///
    /// # Errors
    ///
    /// [`ClientError::Transport`] when the send fails,
    /// [`ClientError::ReplyTimeout`] when no reply arrives in time,
    /// [`ClientError::ConnectionClosed`] when the connection dies mid-wait.
    pub async fn send_and_await(&self, command_line: &str) -> Result<String, ClientError> {
        let (id, mut reply_rx) = self.correlator.install().await;

        {
            let mut sink = self.ws_tx.lock().await;
            if let Err(e) = sink.send(Message::Text(command_line.to_string())).await {
                self.correlator.abandon(id).await;
                return Err(ClientError::Transport(e));
            }
        }

        match timeout(self.reply_timeout, &mut reply_rx).await {
            Ok(Ok(line)) => Ok(line),
            Ok(Err(_)) => Err(ClientError::ConnectionClosed),
            Err(_) => {
                let removed = self.correlator.abandon(id).await;
                if !removed {
                    // The reply landed between the timeout firing and the
                    // abandon taking the lock.
                    if let Ok(line) = reply_rx.try_recv() {
                        return Ok(line);
                    }
                }
                debug!("request {id} timed out after {:?}", self.reply_timeout);
                Err(ClientError::ReplyTimeout(self.reply_timeout))
            }
        }
    }

    /// Sends a [`Command`] and parses the reply envelope.
    ///
    /// `reply_tag` is the tag as the service spells it on the reply side,
    /// which is not always the padded command tag (`AUTH_` commands answer
    /// with `AUTHOK`).
    ///
    /// # Errors
    ///
    /// All of [`send_and_await`](Self::send_and_await)'s errors, plus
    /// [`ClientError::BusUnavailable`] and [`ClientError::MalformedCommand`]
    /// for the gateway's in-band error tokens, and
    /// [`ClientError::UnrecognizedReply`] when the line has no marker.
    pub async fn request(&self, command: &Command, reply_tag: &str) -> Result<Reply, ClientError> {
        let line = self.send_and_await(&command.to_wire()).await?;

        if line == tokens::BUS_UNAVAILABLE {
            return Err(ClientError::BusUnavailable);
        }
        if line == tokens::MALFORMED_COMMAND {
            return Err(ClientError::MalformedCommand);
        }

        Reply::parse(reply_tag, &line).map_err(|_| ClientError::UnrecognizedReply {
            tag: reply_tag.to_string(),
            line,
        })
    }

    /// `true` while a correlated request is outstanding.
    pub async fn has_pending(&self) -> bool {
        self.correlator.has_pending().await
    }
}

/// Drains the read half, routing each line through the correlator.
async fn read_loop(
    mut ws_rx: futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
    correlator: Arc<Correlator>,
    push_tx: mpsc::Sender<String>,
) {
    while let Some(item) = ws_rx.next().await {
        let line = match item {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!("non-UTF-8 binary frame from gateway (ignored)");
                    continue;
                }
            },
            Ok(Message::Close(_)) => {
                debug!("gateway sent Close frame");
                break;
            }
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
            Err(e) => {
                warn!("gateway read error: {e}");
                break;
            }
        };

        if let Some(push) = correlator.deliver(line).await {
            if push_tx.send(push).await.is_err() {
                // Push consumer is gone; keep draining so correlated
                // requests still resolve.
                debug!("push dropped: consumer gone");
            }
        }
    }

    debug!("gateway read loop ended");
    // Dropping push_tx closes the push channel, which is how the caller
    // learns the connection is gone.
}

// ── Tests ─────────────────────────────────────────────────────────────────────

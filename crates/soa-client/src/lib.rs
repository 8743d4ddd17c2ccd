//! Client-side library for the SOA forum gateway.
//!
//! A forum screen talks to the bus through the gateway over one WebSocket
//! connection. That connection is a plain duplex pipe: the gateway attaches
//! no request identifiers to replies, and replies arrive in
//! backend-completion order, so the pairing of replies to requests is the
//! client's problem. This crate solves it with a *correlator*: a handler
//! slot that is swapped to a one-shot waiter for the duration of exactly one
//! outstanding request and restored afterwards. Messages that arrive while
//! the default handler is installed are unsolicited pushes (notifications,
//! events) and flow out on a separate channel.
//!
//! ```text
//!  screen code          soa-client                    gateway
//!  ───────────          ──────────────────────────    ───────
//!  request(cmd) ──────▶ install one-shot ─ send ────▶ (bus exchange)
//!                       ◀─────────────────────────── reply line
//!  Reply ◀───────────── resolve one-shot, restore
//!
//!                       ◀─────────────────────────── push line
//!  push channel ◀────── default handler
//! ```
//!
//! Layers follow the rest of the workspace:
//! - [`application`]: the correlation state machine, pure and I/O-free.
//! - [`infrastructure`]: the WebSocket connection and its reader task.

pub mod application;
pub mod infrastructure;

pub use application::correlator::Correlator;
pub use infrastructure::gateway_conn::{ClientConfig, ClientError, GatewayConnection};

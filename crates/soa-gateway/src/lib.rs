//! soa-gateway library crate.
//!
//! This crate bridges the forum's browser clients to the downstream SOA bus:
//! many long-lived duplex WebSocket connections on one side, one short-lived
//! framed TCP exchange per request on the other.
//!
//! # Architecture
//!
//! ```text
//! Screens (raw command text over WebSocket)
//!         ↕
//! [soa-gateway]
//!   ├── domain/           GatewayConfig
//!   ├── application/      Bus outcome → client reply bytes (pure)
//!   └── infrastructure/
//!         ├── ws_server/  WebSocket accept loop (tokio-tungstenite)
//!         └── bus_client/ One framed TCP exchange per request (soa-core codec)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` is pure: it folds bus-exchange outcomes into reply bytes
//!   but performs no I/O itself.
//! - `infrastructure` owns all sockets and depends on the other layers plus
//!   `tokio` and `tungstenite`.
//!
//! The gateway never interprets command text. It frames whatever the client
//! sent, relays whatever the bus answered, and only speaks for itself through
//! the two fixed error tokens in [`soa_core::protocol::tokens`].

/// Domain layer: runtime configuration.
pub mod domain;

/// Application layer: mapping bus outcomes to client reply bytes.
pub mod application;

/// Infrastructure layer: WebSocket server and bus TCP client.
pub mod infrastructure;

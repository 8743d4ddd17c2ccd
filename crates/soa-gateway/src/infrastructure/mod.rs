//! Infrastructure layer for soa-gateway.
//!
//! Handles all I/O: the WebSocket listener facing the forum's screens and
//! the per-request TCP exchanges against the bus.
//!
//! What does NOT belong here: the outcome-to-token mapping (application
//! layer) and configuration types (domain layer).

pub mod bus_client;
pub mod ws_server;

pub use ws_server::{run_on_listener, run_server};

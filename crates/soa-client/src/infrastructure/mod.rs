//! Infrastructure layer for soa-client.
//!
//! Owns the WebSocket connection to the gateway: the reader task that feeds
//! the correlator, the shared write half, and the request helpers built on
//! top of both.

pub mod gateway_conn;

pub use gateway_conn::{ClientConfig, ClientError, GatewayConnection};

//! Domain layer for soa-gateway.

pub mod config;

pub use config::GatewayConfig;

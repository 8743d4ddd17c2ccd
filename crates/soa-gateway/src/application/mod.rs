//! Application layer for soa-gateway.

pub mod relay;

pub use relay::reply_bytes;

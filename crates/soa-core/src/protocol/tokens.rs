//! Well-known error tokens emitted by the gateway itself.
//!
//! The duplex channel between a screen and the gateway has no side channel
//! for errors, so gateway-level failures travel in-band as fixed text tokens
//! instead of reply envelopes. A client that sent a request and receives one
//! of these knows the request never produced a bus reply.

/// The inbound message could not be framed for the bus (for example, the
/// command exceeds the length-prefix capacity). The request never left the
/// gateway.
pub const MALFORMED_COMMAND: &str = "ERROR_FORMATO";

/// The bus connection could not be established or failed mid-read. The
/// gateway does not retry.
pub const BUS_UNAVAILABLE: &str = "ERROR_TCP";

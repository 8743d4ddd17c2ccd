//! Application layer for soa-client.
//!
//! Holds the request/response correlation logic. Nothing here does I/O;
//! the infrastructure layer feeds inbound lines in and sends outbound
//! lines out.

pub mod correlator;

pub use correlator::Correlator;

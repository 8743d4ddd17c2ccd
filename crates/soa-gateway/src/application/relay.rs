//! Mapping from a bus exchange outcome to the bytes sent back to the client.
//!
//! The duplex channel to the client has no side channel for errors, so every
//! request must produce *some* reply bytes — otherwise the client-side
//! correlator, which consumes exactly one inbound message per request, would
//! wait forever on a backend fault. Transport failures therefore travel
//! in-band as the fixed tokens from [`soa_core::protocol::tokens`].
//!
//! This module is pure: no I/O, no async, unit-testable in isolation.

use soa_core::protocol::tokens;

use crate::infrastructure::bus_client::BusError;

/// Folds a bus exchange outcome into the reply bytes for the client.
///
/// - A successful exchange relays the bus's bytes verbatim.
/// - An encode failure becomes [`tokens::MALFORMED_COMMAND`] — the request
///   never reached the bus.
/// - Any transport failure becomes [`tokens::BUS_UNAVAILABLE`].
pub fn reply_bytes(result: Result<Vec<u8>, BusError>) -> Vec<u8> {
    match result {
        Ok(bytes) => bytes,
        Err(BusError::Encode(_)) => tokens::MALFORMED_COMMAND.as_bytes().to_vec(),
        Err(BusError::Unavailable(_) | BusError::ConnectTimeout(_)) => {
            tokens::BUS_UNAVAILABLE.as_bytes().to_vec()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use soa_core::protocol::framing::FramingError;
    use std::io;
    use std::time::Duration;

    #[test]
    fn test_success_relays_bus_bytes_verbatim() {
        let bytes = b"AUTHOK{\"token\":\"xyz\"}".to_vec();
        assert_eq!(reply_bytes(Ok(bytes.clone())), bytes);
    }

    #[test]
    fn test_empty_success_stays_empty() {
        assert_eq!(reply_bytes(Ok(Vec::new())), Vec::<u8>::new());
    }

    #[test]
    fn test_encode_error_becomes_malformed_token() {
        let err = BusError::Encode(FramingError::FrameTooLarge { len: 100_000 });
        assert_eq!(reply_bytes(Err(err)), tokens::MALFORMED_COMMAND.as_bytes());
    }

    #[test]
    fn test_unavailable_becomes_bus_token() {
        let err = BusError::Unavailable(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert_eq!(reply_bytes(Err(err)), tokens::BUS_UNAVAILABLE.as_bytes());
    }

    #[test]
    fn test_connect_timeout_becomes_bus_token() {
        let err = BusError::ConnectTimeout(Duration::from_secs(5));
        assert_eq!(reply_bytes(Err(err)), tokens::BUS_UNAVAILABLE.as_bytes());
    }
}

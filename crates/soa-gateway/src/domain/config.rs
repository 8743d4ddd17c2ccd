//! Gateway configuration types.
//!
//! [`GatewayConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup — from CLI arguments in production, from
//! `Default` in tests — and shared across session tasks behind an `Arc`.
//! Keeping it a plain struct (no global state, no environment reads inside
//! the domain) keeps the server loop trivially embeddable in tests.

use std::net::SocketAddr;
use std::time::Duration;

/// All runtime configuration for the gateway.
///
/// # Example
///
/// ```rust
/// use soa_gateway::domain::GatewayConfig;
///
/// // Defaults match the deployed topology: WebSocket on 3001, bus on 8000.
/// let cfg = GatewayConfig::default();
/// assert_eq!(cfg.ws_bind_addr.port(), 3001);
/// ```
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address and port the WebSocket listener binds to.
    ///
    /// `0.0.0.0` accepts connections from any interface; set `127.0.0.1` to
    /// restrict to local clients.
    pub ws_bind_addr: SocketAddr,

    /// TCP address of the downstream bus.
    ///
    /// A fresh connection is opened here for every relayed request and
    /// closed when the bus finishes its reply.
    pub bus_addr: SocketAddr,

    /// Maximum time to wait for the bus TCP connect to complete.
    ///
    /// A black-holed bus address would otherwise pin a session task for the
    /// kernel's full connect timeout; with this bound the client receives
    /// the bus-unavailable token promptly instead.
    pub bus_connect_timeout: Duration,

    /// Maximum number of concurrent in-flight bus exchanges.
    ///
    /// Each relayed request consumes one fresh bus connection, so a burst of
    /// client messages becomes a burst of connects. Requests beyond this
    /// bound queue for a permit rather than piling onto the bus.
    pub max_in_flight: usize,
}

impl Default for GatewayConfig {
    /// Returns a config matching the deployed topology.
    ///
    /// | Field               | Default           |
    /// |---------------------|-------------------|
    /// | ws_bind_addr        | `0.0.0.0:3001`    |
    /// | bus_addr            | `127.0.0.1:8000`  |
    /// | bus_connect_timeout | 5 seconds         |
    /// | max_in_flight       | 256               |
    fn default() -> Self {
        Self {
            // Compile-time-known valid socket address strings.
            ws_bind_addr: "0.0.0.0:3001".parse().unwrap(),
            bus_addr: "127.0.0.1:8000".parse().unwrap(),
            bus_connect_timeout: Duration::from_secs(5),
            max_in_flight: 256,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ws_port_is_3001() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.ws_bind_addr.port(), 3001);
    }

    #[test]
    fn test_default_bus_addr_is_local_8000() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.bus_addr.port(), 8000);
        assert_eq!(cfg.bus_addr.ip().to_string(), "127.0.0.1");
    }

    #[test]
    fn test_default_bus_connect_timeout_is_5s() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.bus_connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_default_max_in_flight_is_256() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.max_in_flight, 256);
    }

    #[test]
    fn test_config_custom_values_are_stored() {
        let cfg = GatewayConfig {
            ws_bind_addr: "127.0.0.1:9000".parse().unwrap(),
            bus_addr: "10.0.0.5:8000".parse().unwrap(),
            bus_connect_timeout: Duration::from_secs(1),
            max_in_flight: 8,
        };
        assert_eq!(cfg.ws_bind_addr.port(), 9000);
        assert_eq!(cfg.bus_addr.ip().to_string(), "10.0.0.5");
        assert_eq!(cfg.max_in_flight, 8);
    }
}

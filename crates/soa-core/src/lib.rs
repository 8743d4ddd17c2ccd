//! # soa-core
//!
//! Shared wire-protocol library for the SOA forum system: the length-prefixed
//! framing codec spoken between the gateway and the bus, the command grammar
//! issued by application screens, and the reply-envelope parsing discipline
//! every consumer of the bus must follow.
//!
//! This crate is used by both the gateway process and the client-side
//! connection library. It performs no I/O: everything here is pure
//! encode/decode/parse logic that can be tested without a socket.
//!
//! # Architecture overview
//!
//! The forum's screens (login, posts, comments, private messages, reports)
//! never talk to a service directly. Every interaction is a free-text command
//! sent over one long-lived duplex connection to the gateway, which frames it
//! and relays it to the downstream bus:
//!
//! ```text
//! screen ──"AUTH_login a@b.com pw123"──► gateway ──"00024AUTH_login a@b.com pw123"──► bus
//! screen ◄──────"AUTHOK{\"token\":…}"── gateway ◄──────"AUTHOK{\"token\":…}"──────── bus
//! ```
//!
//! This crate defines the three protocol layers of that exchange:
//!
//! - **`protocol::framing`** – the `{len:05}{payload}` frame put on the bus
//!   TCP connection.
//! - **`protocol::command`** – the `{SERVICE}{verb} {args…}` command line,
//!   with its fixed-width service tag and single-quoting rules.
//! - **`protocol::reply`** – the `{SERVICE}{OK|NK}{rest}` reply envelope and
//!   the marker-substring/JSON-slice parsing contract.

pub mod protocol;

// Re-export the most-used items at the crate root so callers can write
// `soa_core::encode_frame` instead of `soa_core::protocol::framing::encode_frame`.
pub use protocol::command::{Command, ServiceTag, SERVICE_TAG_WIDTH};
pub use protocol::framing::{
    decode_frame, encode_frame, FramingError, LEN_PREFIX_WIDTH, MAX_PAYLOAD_LEN,
};
pub use protocol::reply::{Reply, ReplyBody, ReplyError, ReplyStatus};

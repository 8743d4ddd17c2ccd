//! Protocol module containing the framing codec, command grammar, and reply
//! envelope parsing.

pub mod command;
pub mod framing;
pub mod reply;
pub mod tokens;

pub use command::{tags, Command, ServiceTag};
pub use framing::{decode_frame, encode_frame, FramingError};
pub use reply::{Reply, ReplyBody, ReplyError, ReplyStatus};

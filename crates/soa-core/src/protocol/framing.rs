//! Length-prefixed framing codec for the bus wire protocol.
//!
//! Wire format:
//! ```text
//! [len:5 ASCII digits, zero-padded][payload:len bytes]
//! ```
//! For example, the 24-byte command `AUTH_login a@b.com pw123` is framed as
//! `00024AUTH_login a@b.com pw123`.
//!
//! The prefix width is fixed at five digits, so a payload can be at most
//! 99 999 bytes. Larger payloads are rejected locally with
//! [`FramingError::FrameTooLarge`] and never reach the wire.
//!
//! Only the request direction is framed in practice: the bus signals
//! end-of-reply by closing the TCP connection, so readers accumulate until
//! EOF instead of parsing a prefix. [`decode_frame`] is the exact inverse of
//! [`encode_frame`] and exists so the codec stays testable as a round trip.

use thiserror::Error;

/// Width of the decimal length prefix, in bytes.
pub const LEN_PREFIX_WIDTH: usize = 5;

/// Largest payload representable in a [`LEN_PREFIX_WIDTH`]-digit prefix.
pub const MAX_PAYLOAD_LEN: usize = 99_999;

/// Errors that can occur while encoding or decoding a frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// The payload does not fit in the fixed-width length prefix.
    #[error("payload of {len} bytes exceeds the {MAX_PAYLOAD_LEN}-byte frame limit")]
    FrameTooLarge { len: usize },

    /// The byte slice is shorter than the frame it claims to contain.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The first five bytes are not ASCII decimal digits.
    #[error("invalid length prefix: {0:?}")]
    InvalidLengthPrefix(String),

    /// The frame carries bytes beyond the declared payload length.
    #[error("trailing bytes after payload: prefix declares {declared}, frame carries {available}")]
    TrailingBytes { declared: usize, available: usize },
}

/// Encodes `payload` as a length-prefixed frame.
///
/// Deterministic and side-effect free. The empty payload encodes to the bare
/// prefix `00000`.
///
/// # Errors
///
/// Returns [`FramingError::FrameTooLarge`] if the payload exceeds
/// [`MAX_PAYLOAD_LEN`] bytes.
///
/// # Examples
///
/// ```rust
/// use soa_core::protocol::framing::encode_frame;
///
/// let frame = encode_frame(b"AUTH_login a@b.com pw123").unwrap();
/// assert_eq!(frame, b"00024AUTH_login a@b.com pw123");
/// ```
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FramingError> {
    let len = payload.len();
    if len > MAX_PAYLOAD_LEN {
        return Err(FramingError::FrameTooLarge { len });
    }

    let mut buf = Vec::with_capacity(LEN_PREFIX_WIDTH + len);
    buf.extend_from_slice(format!("{len:05}").as_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Decodes one complete frame, returning the declared length and the payload.
///
/// The frame must be exact: a slice shorter than the declared payload is
/// [`FramingError::InsufficientData`], and bytes beyond it are
/// [`FramingError::TrailingBytes`]. `decode_frame(&encode_frame(p)?)` yields
/// `(p.len(), p)` for every valid payload.
///
/// # Errors
///
/// Returns [`FramingError`] if the prefix is missing, non-numeric, or does
/// not match the number of payload bytes present.
pub fn decode_frame(frame: &[u8]) -> Result<(usize, &[u8]), FramingError> {
    if frame.len() < LEN_PREFIX_WIDTH {
        return Err(FramingError::InsufficientData {
            needed: LEN_PREFIX_WIDTH,
            available: frame.len(),
        });
    }

    let prefix = &frame[..LEN_PREFIX_WIDTH];
    if !prefix.iter().all(u8::is_ascii_digit) {
        return Err(FramingError::InvalidLengthPrefix(
            String::from_utf8_lossy(prefix).into_owned(),
        ));
    }
    // Five ASCII digits always fit in usize, so fold instead of parse.
    let declared = prefix
        .iter()
        .fold(0usize, |acc, b| acc * 10 + usize::from(b - b'0'));

    let available = frame.len() - LEN_PREFIX_WIDTH;
    if available < declared {
        return Err(FramingError::InsufficientData {
            needed: LEN_PREFIX_WIDTH + declared,
            available: frame.len(),
        });
    }
    if available > declared {
        return Err(FramingError::TrailingBytes {
            declared,
            available,
        });
    }

    Ok((declared, &frame[LEN_PREFIX_WIDTH..]))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_empty_payload_yields_bare_prefix() {
        let frame = encode_frame(b"").unwrap();
        assert_eq!(frame, b"00000");
    }

    #[test]
    fn test_encode_login_command_matches_observed_frame() {
        // The canonical example from the deployed system: a 24-byte login
        // command gets a "00024" prefix.
        let frame = encode_frame(b"AUTH_login a@b.com pw123").unwrap();
        assert_eq!(frame, b"00024AUTH_login a@b.com pw123");
    }

    #[test]
    fn test_encode_prefix_is_zero_padded() {
        let frame = encode_frame(b"hi").unwrap();
        assert_eq!(&frame[..LEN_PREFIX_WIDTH], b"00002");
    }

    #[test]
    fn test_encode_at_max_payload_len_succeeds() {
        let payload = vec![b'x'; MAX_PAYLOAD_LEN];
        let frame = encode_frame(&payload).unwrap();
        assert_eq!(&frame[..LEN_PREFIX_WIDTH], b"99999");
        assert_eq!(frame.len(), LEN_PREFIX_WIDTH + MAX_PAYLOAD_LEN);
    }

    #[test]
    fn test_encode_over_max_payload_len_fails() {
        let payload = vec![b'x'; MAX_PAYLOAD_LEN + 1];
        let result = encode_frame(&payload);
        assert_eq!(
            result,
            Err(FramingError::FrameTooLarge {
                len: MAX_PAYLOAD_LEN + 1
            })
        );
    }

    #[test]
    fn test_round_trip_preserves_payload() {
        let payloads: &[&[u8]] = &[
            b"",
            b"FORUMlist_forums token123",
            b"COMMScreate_comment tok 7 'hola mundo'",
            "MSGESsend tok 3 'acentos y ñ'".as_bytes(),
        ];
        for payload in payloads {
            let frame = encode_frame(payload).unwrap();
            let (len, decoded) = decode_frame(&frame).unwrap();
            assert_eq!(len, payload.len());
            assert_eq!(&decoded, payload);
        }
    }

    #[test]
    fn test_decode_short_input_returns_insufficient_data() {
        let result = decode_frame(b"002");
        assert_eq!(
            result,
            Err(FramingError::InsufficientData {
                needed: LEN_PREFIX_WIDTH,
                available: 3,
            })
        );
    }

    #[test]
    fn test_decode_truncated_payload_returns_insufficient_data() {
        // Prefix declares 10 bytes but only 4 follow.
        let result = decode_frame(b"00010abcd");
        assert_eq!(
            result,
            Err(FramingError::InsufficientData {
                needed: 15,
                available: 9,
            })
        );
    }

    #[test]
    fn test_decode_non_digit_prefix_returns_error() {
        let result = decode_frame(b"00x12hello");
        assert!(matches!(result, Err(FramingError::InvalidLengthPrefix(_))));
    }

    #[test]
    fn test_decode_trailing_bytes_returns_error() {
        let result = decode_frame(b"00002hiEXTRA");
        assert_eq!(
            result,
            Err(FramingError::TrailingBytes {
                declared: 2,
                available: 7,
            })
        );
    }

    #[test]
    fn test_byte_length_not_char_length() {
        // "ñ" is one char but two UTF-8 bytes; the prefix counts bytes.
        let frame = encode_frame("ñ".as_bytes()).unwrap();
        assert_eq!(&frame[..LEN_PREFIX_WIDTH], b"00002");
    }
}

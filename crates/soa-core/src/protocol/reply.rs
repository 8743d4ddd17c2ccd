//! Reply-envelope parsing for messages coming back from the bus.
//!
//! A reply is a free-text line carrying a service tag immediately followed by
//! a status marker — `OK` or `NK` — and then the semantic payload:
//!
//! ```text
//! AUTHOK{"token":"xyz"}
//! POSTSNKPost no encontrado
//! FORUMOK[{"id":1,"nombre":"General"}]
//! ```
//!
//! There is no separator between the marker and the payload. The contract is
//! substring search: locate `{TAG}OK` or `{TAG}NK`, treat everything after
//! the marker as the payload, and attempt to parse it as JSON. If the JSON
//! parse fails the payload is a human-readable message and is kept as opaque
//! text — that fallback is a normal outcome, never an error.
//!
//! Some services concatenate a human message *and* a JSON object
//! (`POSTSOKPost encontrado{"id":1,…}`). For that shape a second parse
//! attempt starts at the first `{` or `[` after the marker.
//!
//! The tag in a reply is passed verbatim by the caller rather than derived
//! from [`super::command::ServiceTag`]: the deployed bus is not consistent
//! about padding on the reply side (`AUTHOK` is four significant characters
//! plus the marker), so the consumer owns the exact search string.

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Success/failure marker carried in every reply envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// The `OK` marker: the request succeeded.
    Ok,
    /// The `NK` marker: the request failed; the payload explains why.
    Nk,
}

/// The semantic payload that follows the status marker.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    /// The payload parsed as JSON.
    Json(Value),
    /// The payload is a human-readable message (JSON parse failed).
    Text(String),
}

/// Errors surfaced by [`Reply::parse`].
///
/// A missing marker is the only failure mode. Consumers recover from it by
/// treating the whole line as an opaque message, so this error is advisory
/// rather than fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyError {
    /// Neither `{tag}OK` nor `{tag}NK` occurs in the line.
    #[error("no {tag}OK/{tag}NK marker found in reply")]
    MarkerNotFound { tag: String },

    /// The body is not JSON, or is JSON of the wrong shape for the caller.
    #[error("reply body is not decodable JSON: {0}")]
    BodyNotJson(String),
}

/// A parsed reply envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Success or failure marker.
    pub status: ReplyStatus,
    /// Everything after the marker, parsed as far as possible.
    pub body: ReplyBody,
}

impl Reply {
    /// Locates the `{tag}OK`/`{tag}NK` marker in `line` and parses the rest.
    ///
    /// The earlier of the two markers wins when both occur. The payload is
    /// parsed as JSON when possible, then retried from the first `{` or `[`
    /// for message-plus-JSON envelopes, and otherwise kept as text.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::MarkerNotFound`] when the line carries neither
    /// marker. Callers treat that as "unsolicited or unparseable message"
    /// and fall back to the raw line.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use soa_core::protocol::reply::{Reply, ReplyStatus};
    ///
    /// let reply = Reply::parse("AUTH", "AUTHOK{\"token\":\"xyz\"}").unwrap();
    /// assert_eq!(reply.status, ReplyStatus::Ok);
    /// assert_eq!(reply.json().unwrap()["token"], "xyz");
    /// ```
    pub fn parse(tag: &str, line: &str) -> Result<Self, ReplyError> {
        let ok_marker = format!("{tag}OK");
        let nk_marker = format!("{tag}NK");

        let ok_at = line.find(&ok_marker);
        let nk_at = line.find(&nk_marker);

        let (status, idx, marker_len) = match (ok_at, nk_at) {
            (Some(o), Some(n)) if n < o => (ReplyStatus::Nk, n, nk_marker.len()),
            (Some(o), _) => (ReplyStatus::Ok, o, ok_marker.len()),
            (None, Some(n)) => (ReplyStatus::Nk, n, nk_marker.len()),
            (None, None) => {
                return Err(ReplyError::MarkerNotFound {
                    tag: tag.to_string(),
                })
            }
        };

        let rest = &line[idx + marker_len..];
        Ok(Self {
            status,
            body: parse_body(rest),
        })
    }

    /// `true` when the reply carries the `OK` marker.
    pub fn is_ok(&self) -> bool {
        self.status == ReplyStatus::Ok
    }

    /// The JSON payload, if the body parsed as JSON.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ReplyBody::Json(value) => Some(value),
            ReplyBody::Text(_) => None,
        }
    }

    /// The human-readable payload, JSON or not.
    pub fn text(&self) -> String {
        match &self.body {
            ReplyBody::Json(value) => value.to_string(),
            ReplyBody::Text(text) => text.clone(),
        }
    }

    /// Deserializes the JSON payload into a caller-defined type.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::BodyNotJson`] when the body is opaque text or
    /// does not match `T`'s shape.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ReplyError> {
        match &self.body {
            ReplyBody::Json(value) => serde_json::from_value(value.clone())
                .map_err(|e| ReplyError::BodyNotJson(e.to_string())),
            ReplyBody::Text(text) => Err(ReplyError::BodyNotJson(format!(
                "opaque text payload: {text:?}"
            ))),
        }
    }
}

/// Parses the post-marker payload: JSON first, embedded JSON second, text last.
fn parse_body(rest: &str) -> ReplyBody {
    let trimmed = rest.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return ReplyBody::Json(value);
    }

    // Message-plus-JSON envelope: retry from the first structural character.
    if let Some(start) = trimmed.find(['{', '[']) {
        if let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..]) {
            return ReplyBody::Json(value);
        }
    }

    ReplyBody::Text(rest.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_parse_ok_reply_with_json_object() {
        // The canonical login reply: marker, then a bare JSON object.
        let reply = Reply::parse("AUTH", "AUTHOK{\"token\":\"xyz\"}").unwrap();
        assert_eq!(reply.status, ReplyStatus::Ok);
        assert_eq!(reply.json().unwrap()["token"], "xyz");
    }

    #[test]
    fn test_parse_nk_reply_with_text_body() {
        let reply = Reply::parse("POSTS", "POSTSNKPost no encontrado").unwrap();
        assert_eq!(reply.status, ReplyStatus::Nk);
        assert_eq!(reply.body, ReplyBody::Text("Post no encontrado".to_string()));
    }

    #[test]
    fn test_parse_json_array_body() {
        let reply = Reply::parse("FORUM", "FORUMOK[{\"id\":1},{\"id\":2}]").unwrap();
        assert!(reply.is_ok());
        let forums = reply.json().unwrap().as_array().unwrap();
        assert_eq!(forums.len(), 2);
    }

    #[test]
    fn test_parse_message_plus_json_body() {
        // Some services prepend a human message before the JSON object.
        let reply = Reply::parse("POSTS", "POSTSOKPost encontrado{\"id\":7,\"titulo\":\"hola\"}")
            .unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.json().unwrap()["id"], 7);
    }

    #[test]
    fn test_parse_marker_not_at_line_start() {
        // The marker contract is substring search, not prefix match: some
        // replies arrive still wearing their bus frame.
        let reply = Reply::parse("AUTH", "00026AUTHOK{\"success\":true}").unwrap();
        assert!(reply.is_ok());
        assert_eq!(reply.json().unwrap()["success"], true);
    }

    #[test]
    fn test_parse_missing_marker_is_recoverable_error() {
        let result = Reply::parse("AUTH", "something else entirely");
        assert_eq!(
            result,
            Err(ReplyError::MarkerNotFound {
                tag: "AUTH".to_string()
            })
        );
    }

    #[test]
    fn test_parse_nk_before_ok_picks_earlier_marker() {
        // Pathological but possible: the failure text itself mentions the OK
        // marker. The earlier occurrence decides the status.
        let reply = Reply::parse("AUTH", "AUTHNKexpected AUTHOK here").unwrap();
        assert_eq!(reply.status, ReplyStatus::Nk);
    }

    #[test]
    fn test_parse_empty_body_is_empty_text() {
        let reply = Reply::parse("EVNTS", "EVNTSOK").unwrap();
        assert_eq!(reply.body, ReplyBody::Text(String::new()));
    }

    #[test]
    fn test_decode_into_typed_struct() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct LoginReply {
            token: String,
        }

        let reply = Reply::parse("AUTH", "AUTHOK{\"token\":\"xyz\"}").unwrap();
        let decoded: LoginReply = reply.decode().unwrap();
        assert_eq!(
            decoded,
            LoginReply {
                token: "xyz".to_string()
            }
        );
    }

    #[test]
    fn test_decode_text_body_returns_error() {
        #[derive(Debug, Deserialize)]
        struct Anything {}

        let reply = Reply::parse("AUTH", "AUTHNKcredenciales inválidas").unwrap();
        let result: Result<Anything, _> = reply.decode();
        assert!(matches!(result, Err(ReplyError::BodyNotJson(_))));
    }

    #[test]
    fn test_text_renders_json_body_too() {
        let reply = Reply::parse("AUTH", "AUTHOK{\"token\":\"xyz\"}").unwrap();
        assert_eq!(reply.text(), "{\"token\":\"xyz\"}");
    }
}

//! Command grammar for requests issued to bus services.
//!
//! A command is a free-text line: a fixed-width *service tag* identifying the
//! downstream handler, immediately followed by a verb, followed by
//! space-separated positional arguments:
//!
//! ```text
//! AUTH_login a@b.com pw123
//! COMMScreate_comment <token> 7 'primer comentario'
//! ```
//!
//! Multi-word arguments are wrapped in single quotes. No escaping exists
//! beyond that: an argument containing a single quote, or an unquoted
//! argument containing spaces, is undefined behavior on the wire. The
//! builder quotes whitespace-bearing arguments automatically but does not
//! invent an escape syntax the bus would not understand.

use std::fmt;

/// Width of a service tag, in bytes.
pub const SERVICE_TAG_WIDTH: usize = 5;

/// Fixed-width code naming the downstream service a command is addressed to.
///
/// Tags shorter than [`SERVICE_TAG_WIDTH`] are right-padded with spaces and
/// longer names are truncated, matching the bus's own normalization. The
/// deployed services use exactly five significant characters (`AUTH_`,
/// `FORUM`, `POSTS`, …), so padding only matters for nonstandard callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceTag([u8; SERVICE_TAG_WIDTH]);

impl ServiceTag {
    /// Builds a tag from a name, truncating or space-padding to five bytes.
    pub fn new(name: &str) -> Self {
        let mut bytes = [b' '; SERVICE_TAG_WIDTH];
        for (slot, b) in bytes.iter_mut().zip(name.bytes()) {
            *slot = b;
        }
        Self(bytes)
    }

    /// The tag exactly as it appears on the wire, padding included.
    pub fn as_str(&self) -> &str {
        // Construction only ever stores ASCII-range bytes from `&str` input
        // or the literal tables below, so this cannot fail in practice.
        std::str::from_utf8(&self.0).unwrap_or("?????")
    }

    /// The tag with trailing padding removed, as replies tend to spell it.
    pub fn trimmed(&self) -> &str {
        self.as_str().trim_end_matches(' ')
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Deployed service tags ─────────────────────────────────────────────────────

/// The service tags registered on the forum's bus.
///
/// One constant per downstream service so screens and tests agree on the
/// exact five bytes instead of re-typing them.
pub mod tags {
    use super::ServiceTag;

    /// Authentication service (login, register, token checks).
    pub const AUTH: ServiceTag = ServiceTag(*b"AUTH_");
    /// Forum listing service.
    pub const FORUMS: ServiceTag = ServiceTag(*b"FORUM");
    /// Post CRUD service.
    pub const POSTS: ServiceTag = ServiceTag(*b"POSTS");
    /// Comment service.
    pub const COMMENTS: ServiceTag = ServiceTag(*b"COMMS");
    /// Private message service.
    pub const MESSAGES: ServiceTag = ServiceTag(*b"MSGES");
    /// Profile service.
    pub const PROFILES: ServiceTag = ServiceTag(*b"PROFS");
    /// Report service.
    pub const REPORTS: ServiceTag = ServiceTag(*b"reprt");
    /// Event service.
    pub const EVENTS: ServiceTag = ServiceTag(*b"EVNTS");
    /// Notification service.
    pub const NOTIFICATIONS: ServiceTag = ServiceTag(*b"NOTIF");
}

// ── Command builder ───────────────────────────────────────────────────────────

/// A request line addressed to one bus service.
///
/// Verbs and argument counts are service-specific; this type only enforces
/// the shared surface grammar (tag width, argument separation, quoting).
///
/// # Examples
///
/// ```rust
/// use soa_core::protocol::command::{tags, Command};
///
/// let cmd = Command::new(tags::COMMENTS, "create_comment")
///     .arg("tok123")
///     .arg("7")
///     .arg("primer comentario");
/// assert_eq!(cmd.to_wire(), "COMMScreate_comment tok123 7 'primer comentario'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    service: ServiceTag,
    verb: String,
    args: Vec<String>,
}

impl Command {
    /// Starts a command for `service` with the given verb.
    pub fn new(service: ServiceTag, verb: impl Into<String>) -> Self {
        Self {
            service,
            verb: verb.into(),
            args: Vec::new(),
        }
    }

    /// Appends one positional argument.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    /// The service this command is addressed to.
    pub fn service(&self) -> ServiceTag {
        self.service
    }

    /// Renders the command line exactly as it travels to the gateway.
    ///
    /// Arguments containing whitespace are single-quoted; everything else is
    /// emitted verbatim.
    pub fn to_wire(&self) -> String {
        let mut line = String::with_capacity(SERVICE_TAG_WIDTH + self.verb.len());
        line.push_str(self.service.as_str());
        line.push_str(&self.verb);
        for arg in &self.args {
            line.push(' ');
            if arg.chars().any(char::is_whitespace) {
                line.push('\'');
                line.push_str(arg);
                line.push('\'');
            } else {
                line.push_str(arg);
            }
        }
        line
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_pads_short_names_with_spaces() {
        let tag = ServiceTag::new("calc");
        assert_eq!(tag.as_str(), "calc ");
        assert_eq!(tag.trimmed(), "calc");
    }

    #[test]
    fn test_tag_truncates_long_names() {
        let tag = ServiceTag::new("notifications");
        assert_eq!(tag.as_str(), "notif");
    }

    #[test]
    fn test_deployed_tags_are_five_bytes() {
        for tag in [
            tags::AUTH,
            tags::FORUMS,
            tags::POSTS,
            tags::COMMENTS,
            tags::MESSAGES,
            tags::PROFILES,
            tags::REPORTS,
            tags::EVENTS,
            tags::NOTIFICATIONS,
        ] {
            assert_eq!(tag.as_str().len(), SERVICE_TAG_WIDTH);
        }
    }

    #[test]
    fn test_login_command_renders_observed_line() {
        let cmd = Command::new(tags::AUTH, "login").arg("a@b.com").arg("pw123");
        assert_eq!(cmd.to_wire(), "AUTH_login a@b.com pw123");
    }

    #[test]
    fn test_verb_only_command_has_no_trailing_space() {
        let cmd = Command::new(tags::FORUMS, "list_forums");
        assert_eq!(cmd.to_wire(), "FORUMlist_forums");
    }

    #[test]
    fn test_multi_word_argument_is_single_quoted() {
        let cmd = Command::new(tags::POSTS, "create_post")
            .arg("tok")
            .arg("mi primera publicación");
        assert_eq!(
            cmd.to_wire(),
            "POSTScreate_post tok 'mi primera publicación'"
        );
    }

    #[test]
    fn test_single_word_argument_is_not_quoted() {
        let cmd = Command::new(tags::MESSAGES, "delete").arg("42");
        assert_eq!(cmd.to_wire(), "MSGESdelete 42");
    }

    #[test]
    fn test_display_matches_to_wire() {
        let cmd = Command::new(tags::REPORTS, "list").arg("tok");
        assert_eq!(cmd.to_string(), cmd.to_wire());
    }
}

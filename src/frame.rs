//! Structured protocol frames.
//!
//! A [`Frame`] is a command, an unordered header map and a body. Frames are
//! immutable once built: the decoder produces them from the wire and
//! [`FrameBuilder`] assembles them for sending.
//!
//! The body is held as raw bytes. It is usually text, but frames framed with a
//! `content-length` header may carry any byte value, including `0x00`.

use std::collections::HashMap;

use bytes::Bytes;

mod builder;
mod command;

pub use builder::{AckMode, FrameBuilder};
pub use command::{Command, ParseCommandError};

/// End-of-line byte terminating the command and every header line.
pub const EOL: u8 = b'\n';
/// Byte separating a header key from its value.
pub const HEADER_SEPARATOR: u8 = b':';
/// Byte terminating a frame.
pub const TERMINATOR: u8 = 0x00;

/// Name of the header that switches body framing to an exact byte count.
pub const CONTENT_LENGTH: &str = "content-length";
/// Header naming when an undelivered `SEND` message expires.
pub const EXPIRES: &str = "expires";

/// Header map of a frame.
///
/// Keys are unique. Ordering carries no meaning, so equality compares content
/// only.
pub type Headers = HashMap<String, String>;

/// Errors raised while assembling a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// [`FrameBuilder::build`] was called before a command was chosen.
    #[error("command is mandatory")]
    MissingCommand,
}

/// One protocol message: command, headers and body.
///
/// An absent body and an empty body are the same thing on the wire, so both
/// are represented by an empty byte buffer.
///
/// # Examples
///
/// ```
/// use stompframe::{Command, Frame};
///
/// let frame = Frame::builder()
///     .command(Command::Send)
///     .header("destination", "/queue/a")
///     .text("hello")
///     .build()
///     .expect("command is set");
/// assert_eq!(frame.header("destination"), Some("/queue/a"));
/// assert_eq!(frame.body(), b"hello");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    headers: Headers,
    body: Bytes,
}

impl Frame {
    /// Create a frame from its parts.
    #[must_use]
    pub fn new(command: Command, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            command,
            headers,
            body: body.into(),
        }
    }

    /// Create a frame with no headers and no body.
    #[must_use]
    pub fn bare(command: Command) -> Self { Self::new(command, Headers::new(), Bytes::new()) }

    /// Start assembling a frame.
    #[must_use]
    pub fn builder() -> FrameBuilder { FrameBuilder::new() }

    /// The frame's command.
    #[must_use]
    pub const fn command(&self) -> Command { self.command }

    /// Returns true if the frame carries `command`.
    #[must_use]
    pub fn is(&self, command: Command) -> bool { self.command == command }

    /// All headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers { &self.headers }

    /// Look up a single header value.
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> { self.headers.get(key).map(String::as_str) }

    /// Raw body bytes; empty when the frame has no body.
    #[must_use]
    pub fn body(&self) -> &[u8] { &self.body }

    /// Body as shared bytes.
    #[must_use]
    pub fn body_bytes(&self) -> Bytes { self.body.clone() }

    /// Body interpreted as UTF-8 text, if it is valid UTF-8.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> { std::str::from_utf8(&self.body).ok() }

    /// Returns true if the frame has a non-empty body.
    #[must_use]
    pub fn has_body(&self) -> bool { !self.body.is_empty() }

    /// The `message-id` header of a `MESSAGE` frame.
    ///
    /// Returns `None` for any other command.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> { self.message_header("message-id") }

    /// The `subscription` header of a `MESSAGE` frame.
    ///
    /// Returns `None` for any other command.
    #[must_use]
    pub fn subscription(&self) -> Option<&str> { self.message_header("subscription") }

    fn message_header(&self, key: &str) -> Option<&str> {
        if self.is(Command::Message) {
            self.header(key)
        } else {
            None
        }
    }

    /// Serialize the frame to its wire representation.
    ///
    /// Headers are written as given; no escaping is applied, so keys and
    /// values containing `:` or a newline will not survive a round trip.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = bytes::BytesMut::with_capacity(crate::codec::encoded_len(self));
        crate::codec::encode_frame(self, &mut dst);
        dst.freeze()
    }

    /// Decompose the frame into command, headers and body.
    #[must_use]
    pub fn into_parts(self) -> (Command, Headers, Bytes) { (self.command, self.headers, self.body) }
}

//! Fluent frame assembly and per-command constructors.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use super::{CONTENT_LENGTH, EXPIRES, Command, Frame, FrameError, Headers};

/// Acknowledgement mode requested by a `SUBSCRIBE` frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AckMode {
    /// The broker treats messages as acknowledged on delivery.
    #[default]
    Auto,
    /// An `ACK` acknowledges the message and every earlier one.
    Client,
    /// An `ACK` acknowledges exactly one message.
    ClientIndividual,
}

impl AckMode {
    /// Header value for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Client => "client",
            Self::ClientIndividual => "client-individual",
        }
    }
}

/// Builder for [`Frame`].
///
/// Setting a header twice keeps the last value.
///
/// # Examples
///
/// ```
/// use stompframe::{Command, FrameBuilder};
///
/// let frame = FrameBuilder::new()
///     .command(Command::Send)
///     .header("destination", "/queue/bin")
///     .body(vec![0_u8, 1, 2])
///     .content_length()
///     .build()
///     .expect("command is set");
/// assert_eq!(frame.header("content-length"), Some("3"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct FrameBuilder {
    command: Option<Command>,
    headers: Headers,
    body: Bytes,
}

impl FrameBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Set the command.
    #[must_use]
    pub fn command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    /// Insert a header, replacing any earlier value for the same key.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Insert a header only when `value` is present.
    #[must_use]
    pub fn header_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.header(key, value),
            None => self,
        }
    }

    /// Set a raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a text body.
    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self { self.body(Bytes::from(text.into())) }

    /// Ask the broker to drop a `SEND` message not delivered by `at`.
    ///
    /// Written as the `expires` header in milliseconds since the Unix epoch;
    /// instants before the epoch are written as `0`.
    #[must_use]
    pub fn expires(self, at: SystemTime) -> Self {
        let millis = at
            .duration_since(UNIX_EPOCH)
            .map_or(0, |since| since.as_millis());
        self.header(EXPIRES, millis.to_string())
    }

    /// Declare the current body length in a `content-length` header.
    ///
    /// Call after setting the body. Required for bodies containing `0x00`.
    #[must_use]
    pub fn content_length(self) -> Self {
        let len = self.body.len().to_string();
        self.header(CONTENT_LENGTH, len)
    }

    /// Finish the frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MissingCommand`] if no command was set.
    pub fn build(self) -> Result<Frame, FrameError> {
        let command = self.command.ok_or(FrameError::MissingCommand)?;
        Ok(Frame::new(command, self.headers, self.body))
    }

    pub(crate) fn finish(self, command: Command) -> Frame { Frame::new(command, self.headers, self.body) }
}

impl Frame {
    /// `CONNECT` carrying credentials.
    #[must_use]
    pub fn connect(login: &str, passcode: &str) -> Self {
        FrameBuilder::new()
            .header("login", login)
            .header("passcode", passcode)
            .finish(Command::Connect)
    }

    /// `SEND` with a text body to `destination`.
    #[must_use]
    pub fn send(destination: &str, body: impl Into<String>) -> Self {
        FrameBuilder::new()
            .header("destination", destination)
            .text(body)
            .finish(Command::Send)
    }

    /// `SEND` with a raw body and a matching `content-length` header.
    #[must_use]
    pub fn send_bytes(destination: &str, body: impl Into<Bytes>) -> Self {
        FrameBuilder::new()
            .header("destination", destination)
            .body(body)
            .content_length()
            .finish(Command::Send)
    }

    /// `SUBSCRIBE` to `destination` under subscription `id`.
    #[must_use]
    pub fn subscribe(id: &str, destination: &str, ack: AckMode) -> Self {
        FrameBuilder::new()
            .header("id", id)
            .header("destination", destination)
            .header("ack", ack.as_str())
            .finish(Command::Subscribe)
    }

    /// `UNSUBSCRIBE` subscription `id`.
    #[must_use]
    pub fn unsubscribe(id: &str) -> Self {
        FrameBuilder::new()
            .header("id", id)
            .finish(Command::Unsubscribe)
    }

    /// `ACK` a message delivered on `subscription`.
    #[must_use]
    pub fn ack(subscription: &str, message_id: &str, transaction: Option<&str>) -> Self {
        Self::acknowledgement(Command::Ack, subscription, message_id, transaction)
    }

    /// `NACK` a message delivered on `subscription`.
    #[must_use]
    pub fn nack(subscription: &str, message_id: &str, transaction: Option<&str>) -> Self {
        Self::acknowledgement(Command::Nack, subscription, message_id, transaction)
    }

    fn acknowledgement(
        command: Command,
        subscription: &str,
        message_id: &str,
        transaction: Option<&str>,
    ) -> Self {
        FrameBuilder::new()
            .header("subscription", subscription)
            .header("message-id", message_id)
            .header_opt("transaction", transaction)
            .finish(command)
    }

    /// `BEGIN` a transaction.
    #[must_use]
    pub fn begin(transaction: &str) -> Self { Self::transactional(Command::Begin, transaction) }

    /// `COMMIT` a transaction.
    #[must_use]
    pub fn commit(transaction: &str) -> Self { Self::transactional(Command::Commit, transaction) }

    /// `ABORT` a transaction.
    #[must_use]
    pub fn abort(transaction: &str) -> Self { Self::transactional(Command::Abort, transaction) }

    fn transactional(command: Command, transaction: &str) -> Self {
        FrameBuilder::new()
            .header("transaction", transaction)
            .finish(command)
    }

    /// `DISCONNECT`, optionally asking for a receipt.
    #[must_use]
    pub fn disconnect(receipt: Option<&str>) -> Self {
        FrameBuilder::new()
            .header_opt("receipt", receipt)
            .finish(Command::Disconnect)
    }
}

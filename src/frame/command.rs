//! Protocol verbs carried on the first line of every frame.

use std::{fmt, str::FromStr};

/// The closed set of commands a frame may carry.
///
/// Client frames (`CONNECT`, `SEND`, `SUBSCRIBE`, ...) and server frames
/// (`CONNECTED`, `MESSAGE`, `RECEIPT`, `ERROR`) share one enumeration because
/// the codec decodes both directions.
///
/// # Examples
///
/// ```
/// use stompframe::Command;
///
/// let command: Command = "SEND".parse().expect("known command");
/// assert_eq!(command, Command::Send);
/// assert_eq!(command.as_str(), "SEND");
/// assert!("send".parse::<Command>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Open a session with the broker.
    Connect,
    /// Broker acceptance of a `CONNECT`.
    Connected,
    /// Publish a message to a destination.
    Send,
    /// Register interest in a destination.
    Subscribe,
    /// Cancel a subscription.
    Unsubscribe,
    /// Message delivered by the broker for a subscription.
    Message,
    /// Broker acknowledgement of a frame that requested a receipt.
    Receipt,
    /// Broker-reported failure.
    Error,
    /// Acknowledge consumption of a message.
    Ack,
    /// Reject a message.
    Nack,
    /// Start a transaction.
    Begin,
    /// Commit a transaction.
    Commit,
    /// Roll back a transaction.
    Abort,
    /// Close the session gracefully.
    Disconnect,
}

impl Command {
    /// Every command, in protocol order.
    pub const ALL: [Command; 14] = [
        Command::Connect,
        Command::Connected,
        Command::Send,
        Command::Subscribe,
        Command::Unsubscribe,
        Command::Message,
        Command::Receipt,
        Command::Error,
        Command::Ack,
        Command::Nack,
        Command::Begin,
        Command::Commit,
        Command::Abort,
        Command::Disconnect,
    ];

    /// Wire token for this command.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Connected => "CONNECTED",
            Command::Send => "SEND",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
            Command::Ack => "ACK",
            Command::Nack => "NACK",
            Command::Begin => "BEGIN",
            Command::Commit => "COMMIT",
            Command::Abort => "ABORT",
            Command::Disconnect => "DISCONNECT",
        }
    }

    /// Match a raw command line against the known tokens.
    ///
    /// Matching is exact and case-sensitive. Returns `None` for anything
    /// outside the enumeration.
    #[must_use]
    pub fn from_bytes(token: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|command| command.as_str().as_bytes() == token)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Error returned when a token does not name a [`Command`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown command: {token:?}")]
pub struct ParseCommandError {
    /// The rejected token.
    pub token: String,
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes()).ok_or_else(|| ParseCommandError {
            token: s.to_owned(),
        })
    }
}

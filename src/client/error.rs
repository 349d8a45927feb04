//! Error types for client connections.

use std::{io, time::Duration};

use crate::{
    codec::CodecError,
    frame::{Command, Frame},
};

/// Errors emitted by [`crate::Connection`] and [`crate::StompClientBuilder`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The transport could not be established.
    #[error("failed to connect: {0}")]
    Connect(#[source] io::Error),
    /// A connection option was rejected.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    /// The broker refused or garbled the handshake.
    #[error("protocol error: {0}")]
    Protocol(#[from] HandshakeError),
    /// Received bytes do not form a valid frame.
    #[error("codec error: {0}")]
    Codec(#[source] CodecError),
    /// Transport failure on an established connection.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// A timed receive gave up before a frame arrived.
    #[error("no frame received within {0:?}")]
    Timeout(Duration),
    /// The connection is shutting down.
    #[error("connection closed")]
    Closed,
    /// The peer closed the connection between frames.
    #[error("connection closed by peer")]
    Disconnected,
    /// The broker sent an `ERROR` frame while a reply was awaited.
    #[error("broker error: {}", rejection_message(.0))]
    Broker(Box<Frame>),
    /// Only `MESSAGE` frames with `subscription` and `message-id` headers
    /// can be acknowledged.
    #[error("cannot acknowledge {0} frame")]
    NotAcknowledgeable(Command),
}

impl ClientError {
    /// Returns true if the error came from the local shutdown path.
    #[must_use]
    pub fn is_closed(&self) -> bool { matches!(self, Self::Closed) }

    /// Returns true if the error is a timed receive giving up.
    #[must_use]
    pub fn is_timeout(&self) -> bool { matches!(self, Self::Timeout(_)) }

    /// The `ERROR` frame the broker answered with, if any.
    #[must_use]
    pub fn error_frame(&self) -> Option<&Frame> {
        match self {
            Self::Broker(frame) => Some(frame),
            Self::Protocol(handshake) => handshake.error_frame(),
            _ => None,
        }
    }
}

impl From<CodecError> for ClientError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => Self::Io(e),
            err if err.is_clean_close() => Self::Disconnected,
            err => Self::Codec(err),
        }
    }
}

/// Reasons a `CONNECT` exchange did not yield a `CONNECTED` frame.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    /// The peer closed the stream without replying.
    #[error("no response to CONNECT")]
    NoResponse,
    /// The peer replied with an `ERROR` frame.
    #[error("connection rejected: {}", rejection_message(.0))]
    Rejected(Box<Frame>),
    /// The peer replied with a frame other than `CONNECTED` or `ERROR`.
    #[error("unexpected response to CONNECT: {0}")]
    Unexpected(Command),
}

impl HandshakeError {
    /// The `ERROR` frame sent by the broker, if the handshake was rejected.
    #[must_use]
    pub fn error_frame(&self) -> Option<&Frame> {
        match self {
            Self::Rejected(frame) => Some(frame),
            _ => None,
        }
    }
}

fn rejection_message(frame: &Frame) -> &str { frame.header("message").unwrap_or("no message") }

/// Invalid connection option.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The option key is not recognised.
    #[error("unknown connection option: {key:?}")]
    UnknownOption {
        /// Key as supplied.
        key: String,
    },
    /// The option value could not be parsed or is out of range.
    #[error("invalid value {value:?} for connection option {key:?}")]
    InvalidValue {
        /// Option key.
        key: String,
        /// Value as supplied.
        value: String,
    },
    /// A `key=value` pair lacked its `=`.
    #[error("expected key=value, got {0:?}")]
    MalformedPair(String),
}

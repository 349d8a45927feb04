//! Error types for the codec layer.
//!
//! The taxonomy separates three failure sources:
//!
//! - [`FramingError`]: the bytes on the wire do not form a valid frame (unknown command, malformed
//!   header, bad `content-length`, missing terminator, oversized frame).
//! - [`EofError`]: the stream ended. A close at a frame boundary is clean; anything else loses
//!   data.
//! - I/O errors from the underlying transport.
//!
//! [`CodecError`] wraps all three. No variant is recovered from silently: the
//! decoder resets to the start of a frame and the error is surfaced.

use std::{fmt, io};

use thiserror::Error;

/// Stage of the decoder when an error was raised.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeStage {
    /// Reading the command line.
    Command,
    /// Reading header lines.
    Headers,
    /// Reading the body.
    Body,
    /// Expecting the terminator after a `content-length` body.
    Terminator,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Command => "command",
            Self::Headers => "headers",
            Self::Body => "body",
            Self::Terminator => "terminator",
        })
    }
}

/// Wire-level violations detected while decoding a frame.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// The command line does not name a known command.
    #[error("unknown command: {token:?}")]
    UnknownCommand {
        /// Raw command line, decoded lossily for diagnostics.
        token: String,
    },

    /// A header line has no `:` separator.
    #[error("malformed header line: {line:?}")]
    MalformedHeader {
        /// Raw header line, decoded lossily for diagnostics.
        line: String,
    },

    /// The `content-length` header is not a non-negative decimal integer.
    #[error("invalid content-length: {value:?}")]
    InvalidContentLength {
        /// Header value as received.
        value: String,
    },

    /// The byte following a `content-length` body was not the terminator.
    #[error("expected frame terminator after body, found {found:#04x}")]
    MissingTerminator {
        /// Byte found instead of `0x00`.
        found: u8,
    },

    /// Command or header bytes are not valid UTF-8.
    #[error("invalid UTF-8 in {stage}")]
    InvalidUtf8 {
        /// Stage holding the invalid bytes.
        stage: DecodeStage,
    },

    /// The frame exceeds the configured maximum length.
    #[error("frame exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Frame size observed or declared so far.
        size: usize,
        /// Maximum allowed frame size.
        max: usize,
    },
}

/// End-of-stream conditions.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EofError {
    /// The peer closed the stream between frames.
    #[error("connection closed cleanly at frame boundary")]
    CleanClose,

    /// The stream ended while a frame was being read.
    #[error("premature EOF in {stage} after {bytes_received} frame bytes")]
    MidFrame {
        /// Stage the decoder had reached.
        stage: DecodeStage,
        /// Bytes of the frame consumed before EOF.
        bytes_received: usize,
    },

    /// The stream ended inside a body declared by `content-length`.
    #[error("truncated frame: {received} of {expected} body bytes received")]
    TruncatedBody {
        /// Body bytes received before EOF.
        received: usize,
        /// Length declared by `content-length`.
        expected: usize,
    },
}

/// Top-level codec error.
///
/// # Examples
///
/// ```
/// use stompframe::codec::{CodecError, EofError, FramingError};
///
/// let err = CodecError::Framing(FramingError::UnknownCommand {
///     token: "FOO".to_owned(),
/// });
/// assert_eq!(err.error_type(), "framing");
///
/// let err = CodecError::Eof(EofError::TruncatedBody {
///     received: 3,
///     expected: 10,
/// });
/// assert!(err.is_truncated());
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes do not form a valid frame.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// End of stream.
    #[error("EOF: {0}")]
    Eof(#[from] EofError),
}

impl CodecError {
    /// Returns true if the peer closed the stream between frames.
    #[must_use]
    pub fn is_clean_close(&self) -> bool { matches!(self, Self::Eof(EofError::CleanClose)) }

    /// Returns true if the stream ended inside a declared-length body.
    #[must_use]
    pub fn is_truncated(&self) -> bool { matches!(self, Self::Eof(EofError::TruncatedBody { .. })) }

    /// Returns true if the decoder rejected an unknown command.
    #[must_use]
    pub fn is_unknown_command(&self) -> bool {
        matches!(self, Self::Framing(FramingError::UnknownCommand { .. }))
    }

    /// Returns the error category for logging and metrics.
    ///
    /// One of `"framing"`, `"io"` or `"eof"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Framing(_) => "framing",
            Self::Io(_) => "io",
            Self::Eof(_) => "eof",
        }
    }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => e,
            CodecError::Framing(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            CodecError::Eof(e) => io::Error::new(io::ErrorKind::UnexpectedEof, e),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

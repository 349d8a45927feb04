//! Frame codec for the text wire protocol.
//!
//! [`StompCodec`] implements `tokio_util`'s [`Decoder`] and [`Encoder`] so it
//! can drive any async byte stream. The wire layout is:
//!
//! ```text
//! COMMAND\n
//! key:value\n        (zero or more)
//! \n
//! body bytes
//! \0
//! ```
//!
//! # Body framing
//!
//! Without a `content-length` header the body runs to the first `0x00` byte,
//! so a body containing `0x00` is cut short there. This is the wire contract,
//! not a decoder bug: senders of binary bodies must declare
//! `content-length`, in which case exactly that many bytes are read verbatim
//! and the following byte must be the terminator.
//!
//! # Headers
//!
//! Each header line is split at its first `:`, so values may contain `:`.
//! When a key repeats within one frame the last occurrence wins. No escaping
//! is applied in either direction.
//!
//! # Error Handling
//!
//! Failures are reported through [`CodecError`]; see the [`error`] module.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::Frame;

mod decode;
mod encode;
pub mod error;

use decode::FrameDecoder;
pub use encode::{encode_frame, encoded_len};
pub use error::{CodecError, DecodeStage, EofError, FramingError};

/// Minimum frame length in bytes.
///
/// Frame lengths passed to [`StompCodec::new`] are clamped to at least this
/// value.
pub const MIN_FRAME_LENGTH: usize = 64;

/// Maximum frame length in bytes (64 MiB).
///
/// Frame lengths passed to [`StompCodec::new`] are clamped to at most this
/// value to prevent unbounded allocation.
pub const MAX_FRAME_LENGTH: usize = 64 * 1024 * 1024;

/// Frame length used by [`StompCodec::default`] (8 MiB).
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 8 * 1024 * 1024;

pub(crate) fn clamp_frame_length(value: usize) -> usize {
    value.clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH)
}

/// Codec turning a byte stream into [`Frame`]s and back.
///
/// The decoder side is stateful: a partially received frame is kept inside
/// the codec between calls, so one codec instance must be dedicated to one
/// stream.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use stompframe::{Command, Frame, StompCodec};
/// use tokio_util::codec::{Decoder, Encoder};
///
/// let mut codec = StompCodec::default();
/// let mut wire = BytesMut::new();
/// codec
///     .encode(Frame::send("/queue/a", "hello"), &mut wire)
///     .expect("frame fits");
///
/// let frame = codec
///     .decode(&mut wire)
///     .expect("valid frame")
///     .expect("complete frame");
/// assert_eq!(frame.command(), Command::Send);
/// assert_eq!(frame.body(), b"hello");
/// ```
#[derive(Debug)]
pub struct StompCodec {
    decoder: FrameDecoder,
    max_frame_length: usize,
}

impl StompCodec {
    /// Construct a codec accepting frames up to `max_frame_length` bytes.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        let max_frame_length = clamp_frame_length(max_frame_length);
        Self {
            decoder: FrameDecoder::new(max_frame_length),
            max_frame_length,
        }
    }

    /// Return the maximum frame length accepted by this codec.
    #[must_use]
    pub fn max_frame_length(&self) -> usize { self.max_frame_length }

    /// Decode exactly one frame from a complete byte slice.
    ///
    /// Leading padding is skipped and bytes after the first frame are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Framing`] for malformed input and
    /// [`CodecError::Eof`] when `bytes` ends before a frame is complete,
    /// including [`EofError::CleanClose`] when it holds no frame at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use stompframe::{Command, StompCodec};
    ///
    /// let frame = StompCodec::decode_frame(b"\n\0\nSEND\n\n\0").expect("valid frame");
    /// assert_eq!(frame.command(), Command::Send);
    /// assert!(frame.headers().is_empty());
    /// assert!(!frame.has_body());
    /// ```
    pub fn decode_frame(bytes: &[u8]) -> Result<Frame, CodecError> {
        let mut codec = Self::new(MAX_FRAME_LENGTH);
        let mut buf = BytesMut::from(bytes);
        codec
            .decode_eof(&mut buf)?
            .ok_or(CodecError::Eof(EofError::CleanClose))
    }
}

impl Default for StompCodec {
    fn default() -> Self { Self::new(DEFAULT_MAX_FRAME_LENGTH) }
}

impl Decoder for StompCodec {
    type Item = Frame;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decoder.decode(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decoder.decode_eof(src)
    }
}

impl Encoder<Frame> for StompCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&Frame>::encode(self, &item, dst)
    }
}

impl Encoder<&Frame> for StompCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = encoded_len(item);
        if size > self.max_frame_length {
            return Err(CodecError::Framing(FramingError::OversizedFrame {
                size,
                max: self.max_frame_length,
            }));
        }
        encode_frame(item, dst);
        Ok(())
    }
}

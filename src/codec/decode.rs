//! Incremental frame decoder.
//!
//! The decoder walks a frame in one pass: padding, command line, header
//! lines, then the body. Bytes are consumed from the read buffer as soon as
//! they are classified and partial lines are kept between calls, so nothing
//! is scanned twice when a frame arrives in several reads.

use std::mem;

use bytes::{Buf, BytesMut};

use super::error::{CodecError, DecodeStage, EofError, FramingError};
use crate::frame::{CONTENT_LENGTH, Command, EOL, Frame, HEADER_SEPARATOR, Headers, TERMINATOR};

#[derive(Clone, Copy, Debug)]
enum Stage {
    /// Discarding heart-beat newlines and stray terminators between frames.
    Padding,
    Command,
    Headers(Command),
    /// Body runs until the next terminator byte.
    DelimitedBody(Command),
    /// Body length fixed by `content-length`.
    SizedBody(Command, usize),
    Terminator(Command),
    /// Dropping the rest of a rejected frame up to its terminator.
    SkipFrame,
    /// Dropping the declared body and terminator of a rejected frame.
    Discard(usize),
}

impl Stage {
    fn public(self) -> DecodeStage {
        match self {
            Self::Padding | Self::Command => DecodeStage::Command,
            Self::Headers(_) => DecodeStage::Headers,
            Self::DelimitedBody(_) | Self::SizedBody(..) => DecodeStage::Body,
            Self::Terminator(_) => DecodeStage::Terminator,
            Self::SkipFrame | Self::Discard(_) => DecodeStage::Body,
        }
    }
}

/// Stateful decoder turning a byte stream into [`Frame`]s.
#[derive(Debug)]
pub(crate) struct FrameDecoder {
    max_frame_length: usize,
    stage: Stage,
    line: Vec<u8>,
    headers: Headers,
    body: BytesMut,
    frame_bytes: usize,
}

impl FrameDecoder {
    pub(crate) fn new(max_frame_length: usize) -> Self {
        Self {
            max_frame_length,
            stage: Stage::Padding,
            line: Vec::new(),
            headers: Headers::new(),
            body: BytesMut::new(),
            frame_bytes: 0,
        }
    }

    /// Decode the next frame from `src`.
    ///
    /// Returns `Ok(None)` once `src` is exhausted without completing a frame.
    /// On error the rest of the rejected frame is dropped: a declared body is
    /// skipped by its length, otherwise bytes are skipped through the next
    /// terminator. Decoding resumes with the frame after it.
    pub(crate) fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, CodecError> {
        let result = self.step(src);
        if result.is_err() {
            self.resync();
        }
        result
    }

    /// Decode after the peer closed the stream.
    ///
    /// A close between frames yields `Ok(None)`; a close inside a frame is an
    /// [`EofError`].
    pub(crate) fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, CodecError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        let err = match self.stage {
            Stage::Padding => return Ok(None),
            // The rejected frame was already reported.
            Stage::SkipFrame | Stage::Discard(_) => {
                self.reset();
                return Ok(None);
            }
            Stage::SizedBody(_, expected) => EofError::TruncatedBody {
                received: self.body.len(),
                expected,
            },
            stage => EofError::MidFrame {
                stage: stage.public(),
                bytes_received: self.frame_bytes,
            },
        };
        self.reset();
        Err(err.into())
    }

    fn step(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, CodecError> {
        loop {
            match self.stage {
                Stage::Padding => {
                    let skip = src
                        .iter()
                        .take_while(|&&byte| byte == EOL || byte == TERMINATOR)
                        .count();
                    src.advance(skip);
                    if src.is_empty() {
                        return Ok(None);
                    }
                    self.stage = Stage::Command;
                }
                Stage::Command => {
                    if !self.take_line(src)? {
                        return Ok(None);
                    }
                    let command = parse_command(&self.line)?;
                    tracing::trace!(%command, "decoded command line");
                    self.line.clear();
                    self.stage = Stage::Headers(command);
                }
                Stage::Headers(command) => {
                    if !self.take_line(src)? {
                        return Ok(None);
                    }
                    if self.line.is_empty() {
                        self.stage = self.body_stage(command)?;
                    } else {
                        let (key, value) = parse_header(&self.line)?;
                        self.headers.insert(key, value);
                        self.line.clear();
                    }
                }
                Stage::DelimitedBody(command) => {
                    let Some(end) = src.iter().position(|&byte| byte == TERMINATOR) else {
                        let available = src.len();
                        self.body.extend_from_slice(&src[..]);
                        src.clear();
                        self.count(available)?;
                        return Ok(None);
                    };
                    self.body.extend_from_slice(&src[..end]);
                    src.advance(end + 1);
                    self.stage = Stage::Padding;
                    self.count(end + 1)?;
                    return Ok(Some(self.finish(command)));
                }
                Stage::SizedBody(command, expected) => {
                    let take = (expected - self.body.len()).min(src.len());
                    self.body.extend_from_slice(&src[..take]);
                    src.advance(take);
                    self.frame_bytes += take;
                    if self.body.len() < expected {
                        return Ok(None);
                    }
                    self.stage = Stage::Terminator(command);
                }
                Stage::Terminator(command) => {
                    let Some(&found) = src.first() else {
                        return Ok(None);
                    };
                    src.advance(1);
                    if found != TERMINATOR {
                        return Err(FramingError::MissingTerminator { found }.into());
                    }
                    self.frame_bytes += 1;
                    return Ok(Some(self.finish(command)));
                }
                Stage::SkipFrame => {
                    let Some(end) = src.iter().position(|&byte| byte == TERMINATOR) else {
                        src.clear();
                        return Ok(None);
                    };
                    src.advance(end + 1);
                    self.stage = Stage::Padding;
                }
                Stage::Discard(remaining) => {
                    let take = remaining.min(src.len());
                    src.advance(take);
                    if take < remaining {
                        self.stage = Stage::Discard(remaining - take);
                        return Ok(None);
                    }
                    self.stage = Stage::Padding;
                }
            }
        }
    }

    /// Move bytes up to the next end-of-line into `self.line`.
    ///
    /// Returns true once the line is complete; the end-of-line byte is
    /// consumed but not stored. Scanned bytes are consumed even when the
    /// line overflows the frame limit.
    fn take_line(&mut self, src: &mut BytesMut) -> Result<bool, CodecError> {
        let (len, complete) = match src.iter().position(|&byte| byte == EOL) {
            Some(end) => (end, true),
            None => (src.len(), false),
        };
        let consumed = len + usize::from(complete);
        self.line.extend_from_slice(&src[..len]);
        src.advance(consumed);
        self.count(consumed)?;
        Ok(complete)
    }

    fn body_stage(&mut self, command: Command) -> Result<Stage, CodecError> {
        let Some(value) = self.headers.get(CONTENT_LENGTH) else {
            return Ok(Stage::DelimitedBody(command));
        };
        let expected = parse_content_length(value)?;
        let size = self.frame_bytes.saturating_add(expected).saturating_add(1);
        if size > self.max_frame_length {
            self.stage = Stage::Discard(expected.saturating_add(1));
            return Err(FramingError::OversizedFrame {
                size,
                max: self.max_frame_length,
            }
            .into());
        }
        self.body.reserve(expected);
        Ok(Stage::SizedBody(command, expected))
    }

    fn count(&mut self, bytes: usize) -> Result<(), CodecError> {
        self.frame_bytes = self.frame_bytes.saturating_add(bytes);
        if self.frame_bytes > self.max_frame_length {
            return Err(FramingError::OversizedFrame {
                size: self.frame_bytes,
                max: self.max_frame_length,
            }
            .into());
        }
        Ok(())
    }

    fn finish(&mut self, command: Command) -> Frame {
        let headers = mem::take(&mut self.headers);
        let body = self.body.split().freeze();
        tracing::trace!(
            %command,
            headers = headers.len(),
            body.bytes = body.len(),
            "decoded frame"
        );
        self.stage = Stage::Padding;
        self.line.clear();
        self.frame_bytes = 0;
        Frame::new(command, headers, body)
    }

    /// Choose where decoding continues after an error.
    ///
    /// A `Discard` stage set while rejecting a declared body is kept. An
    /// error inside any other frame skips through that frame's terminator.
    fn resync(&mut self) {
        let next = match self.stage {
            stage @ (Stage::Padding | Stage::Discard(_)) => stage,
            _ => Stage::SkipFrame,
        };
        self.reset();
        self.stage = next;
        tracing::trace!(?next, "resynchronising after decode error");
    }

    fn reset(&mut self) {
        self.stage = Stage::Padding;
        self.line.clear();
        self.headers.clear();
        self.body.clear();
        self.frame_bytes = 0;
    }
}

fn parse_command(line: &[u8]) -> Result<Command, FramingError> {
    Command::from_bytes(line).ok_or_else(|| FramingError::UnknownCommand {
        token: String::from_utf8_lossy(line).into_owned(),
    })
}

/// Split a header line at its first separator.
///
/// Values may themselves contain `:`.
fn parse_header(line: &[u8]) -> Result<(String, String), FramingError> {
    let Some(split) = line.iter().position(|&byte| byte == HEADER_SEPARATOR) else {
        return Err(FramingError::MalformedHeader {
            line: String::from_utf8_lossy(line).into_owned(),
        });
    };
    let utf8 = |bytes: &[u8]| {
        String::from_utf8(bytes.to_vec()).map_err(|_| FramingError::InvalidUtf8 {
            stage: DecodeStage::Headers,
        })
    };
    Ok((utf8(&line[..split])?, utf8(&line[split + 1..])?))
}

fn parse_content_length(value: &str) -> Result<usize, FramingError> {
    let invalid = || FramingError::InvalidContentLength {
        value: value.to_owned(),
    };
    if value.is_empty() || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse().map_err(|_| invalid())
}

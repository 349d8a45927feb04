//! Frame serialization.

use bytes::{BufMut, BytesMut};

use crate::frame::{EOL, Frame, HEADER_SEPARATOR, TERMINATOR};

/// Number of bytes [`encode_frame`] writes for `frame`.
#[must_use]
pub fn encoded_len(frame: &Frame) -> usize {
    let command = frame.command().as_str().len() + 1;
    let headers: usize = frame
        .headers()
        .iter()
        .map(|(key, value)| key.len() + 1 + value.len() + 1)
        .sum();
    command + headers + 1 + frame.body().len() + 1
}

/// Append the wire form of `frame` to `dst`.
///
/// Layout: command line, one `key:value` line per header, a blank line, the
/// body bytes and the terminator. Header order follows map iteration order.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) {
    dst.reserve(encoded_len(frame));
    dst.extend_from_slice(frame.command().as_str().as_bytes());
    dst.put_u8(EOL);
    for (key, value) in frame.headers() {
        dst.extend_from_slice(key.as_bytes());
        dst.put_u8(HEADER_SEPARATOR);
        dst.extend_from_slice(value.as_bytes());
        dst.put_u8(EOL);
    }
    dst.put_u8(EOL);
    dst.extend_from_slice(frame.body());
    dst.put_u8(TERMINATOR);
}

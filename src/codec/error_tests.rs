//! Unit tests for codec error types.

use std::io;

use rstest::rstest;

use super::{CodecError, DecodeStage, EofError, FramingError};

#[test]
fn clean_eof_is_detectable() {
    let err = CodecError::Eof(EofError::CleanClose);
    assert!(err.is_clean_close());
    assert!(!err.is_truncated());
}

#[test]
fn truncated_body_is_detectable() {
    let err = CodecError::Eof(EofError::TruncatedBody {
        received: 4,
        expected: 9,
    });
    assert!(err.is_truncated());
    assert!(!err.is_clean_close());
    assert!(err.to_string().contains("4 of 9"), "got: {err}");
}

#[test]
fn unknown_command_keeps_token() {
    let err = CodecError::from(FramingError::UnknownCommand {
        token: "FOO".to_owned(),
    });
    assert!(err.is_unknown_command());
    assert!(err.to_string().contains("\"FOO\""), "got: {err}");
}

#[rstest]
#[case(CodecError::Framing(FramingError::MissingTerminator { found: b'x' }), io::ErrorKind::InvalidData)]
#[case(CodecError::Eof(EofError::MidFrame { stage: DecodeStage::Headers, bytes_received: 7 }), io::ErrorKind::UnexpectedEof)]
#[case(CodecError::Io(io::Error::from(io::ErrorKind::TimedOut)), io::ErrorKind::TimedOut)]
fn codec_error_converts_to_io_error_with_correct_kind(
    #[case] err: CodecError,
    #[case] expected: io::ErrorKind,
) {
    let io_err: io::Error = err.into();
    assert_eq!(io_err.kind(), expected);
}

#[test]
fn error_type_returns_correct_category() {
    assert_eq!(
        CodecError::Framing(FramingError::InvalidUtf8 {
            stage: DecodeStage::Command
        })
        .error_type(),
        "framing"
    );
    assert_eq!(CodecError::Io(io::Error::other("test")).error_type(), "io");
    assert_eq!(CodecError::Eof(EofError::CleanClose).error_type(), "eof");
}

#[test]
fn missing_terminator_reports_hex_byte() {
    let err = FramingError::MissingTerminator { found: 0x41 };
    assert_eq!(
        err.to_string(),
        "expected frame terminator after body, found 0x41"
    );
}

//! Frames a broker typically sends.

use stompframe::{Command, Frame, FrameBuilder};

/// `CONNECTED` frame announcing protocol version 1.2.
#[must_use]
pub fn connected() -> Frame {
    FrameBuilder::new()
        .command(Command::Connected)
        .header("version", "1.2")
        .build()
        .expect("command is set")
}

/// `ERROR` frame carrying `message`.
#[must_use]
pub fn error(message: &str) -> Frame {
    FrameBuilder::new()
        .command(Command::Error)
        .header("message", message)
        .build()
        .expect("command is set")
}

/// `MESSAGE` frame delivered for `subscription`.
#[must_use]
pub fn message(subscription: &str, message_id: &str, body: &str) -> Frame {
    FrameBuilder::new()
        .command(Command::Message)
        .header("subscription", subscription)
        .header("message-id", message_id)
        .header("destination", "/queue/test")
        .text(body)
        .build()
        .expect("command is set")
}

/// `RECEIPT` frame acknowledging `receipt_id`.
#[must_use]
pub fn receipt(receipt_id: &str) -> Frame {
    FrameBuilder::new()
        .command(Command::Receipt)
        .header("receipt-id", receipt_id)
        .build()
        .expect("command is set")
}

#![doc(html_root_url = "https://docs.rs/stompframe/latest")]
//! Public API for the `stompframe` library.
//!
//! This crate provides an asynchronous client for text-framed message broker
//! protocols: a [`StompCodec`] turning byte streams into [`Frame`]s and a
//! [`Connection`] that sends frames and receives them in blocking, timed or
//! asynchronous mode.

pub mod client;
pub mod codec;
pub mod frame;
pub mod metrics;

pub use client::{ClientError, Closer, Connection, PendingFrame, StompClientBuilder};
pub use codec::{CodecError, StompCodec};
pub use frame::{AckMode, Command, Frame, FrameBuilder, FrameError, Headers};
pub use metrics::{CONNECTIONS_ACTIVE, Direction, ERRORS_TOTAL, FRAMES_PROCESSED};

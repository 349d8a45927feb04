//! Span and timing helpers for client operations.

use std::time::Instant;

use tracing::{Level, Span};

use super::tracing_config::TracingConfig;

/// Create a span whose level is chosen at runtime.
///
/// Each arm expands a level-specific span macro so the span metadata stays
/// static per arm.
macro_rules! dynamic_span {
    ($level:expr, $name:expr $(, $($field:tt)*)?) => {
        match $level {
            Level::ERROR => tracing::error_span!($name $(, $($field)*)?),
            Level::WARN  => tracing::warn_span!($name $(, $($field)*)?),
            Level::INFO  => tracing::info_span!($name $(, $($field)*)?),
            Level::DEBUG => tracing::debug_span!($name $(, $($field)*)?),
            Level::TRACE => tracing::trace_span!($name $(, $($field)*)?),
        }
    };
}

#[expect(
    clippy::cognitive_complexity,
    reason = "five match arms from dynamic_span! expansion"
)]
pub(crate) fn connect_span(config: &TracingConfig, peer_addr: &str) -> Span {
    dynamic_span!(
        config.connect_level,
        "client.connect",
        peer.addr = peer_addr,
        result = tracing::field::Empty
    )
}

#[expect(
    clippy::cognitive_complexity,
    reason = "five match arms from dynamic_span! expansion"
)]
pub(crate) fn send_span(config: &TracingConfig, command: &str, frame_bytes: usize) -> Span {
    dynamic_span!(
        config.send_level,
        "client.send",
        frame.command = command,
        frame.bytes = frame_bytes
    )
}

/// `frame.command` and `result` are recorded once the receive settles.
#[expect(
    clippy::cognitive_complexity,
    reason = "five match arms from dynamic_span! expansion"
)]
pub(crate) fn receive_span(config: &TracingConfig, mode: &'static str) -> Span {
    dynamic_span!(
        config.receive_level,
        "client.receive",
        receive.mode = mode,
        frame.command = tracing::field::Empty,
        result = tracing::field::Empty
    )
}

#[expect(
    clippy::cognitive_complexity,
    reason = "five match arms from dynamic_span! expansion"
)]
pub(crate) fn close_span(config: &TracingConfig) -> Span {
    dynamic_span!(config.close_level, "client.close")
}

/// Start a timer when timing is enabled for the operation.
pub(crate) fn start_timer(enabled: bool) -> Option<Instant> { enabled.then(Instant::now) }

/// Emit an `elapsed_us` event at `DEBUG` if a timer was started.
pub(crate) fn emit_timing_event(start: Option<Instant>) {
    if let Some(start) = start {
        let elapsed_us = start.elapsed().as_micros();
        tracing::debug!(elapsed_us = elapsed_us, "operation.timing");
    }
}

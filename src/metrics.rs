//! Metric helpers for broker connections.
//!
//! This module defines metric names and thin helpers over the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to nothing.

/// Name of the gauge tracking open connections.
pub const CONNECTIONS_ACTIVE: &str = "stompframe_connections_active";
/// Name of the counter tracking frames sent and received.
pub const FRAMES_PROCESSED: &str = "stompframe_frames_processed_total";
/// Name of the counter tracking failed sends and receives.
pub const ERRORS_TOTAL: &str = "stompframe_errors_total";

/// Direction of a processed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Frames read from the broker.
    Inbound,
    /// Frames written to the broker.
    Outbound,
}

impl Direction {
    /// Label value used for the `direction` label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

/// Increment the open connections gauge.
#[cfg(feature = "metrics")]
pub fn inc_connections() { metrics::gauge!(CONNECTIONS_ACTIVE).increment(1.0); }

/// Decrement the open connections gauge.
#[cfg(feature = "metrics")]
pub fn dec_connections() { metrics::gauge!(CONNECTIONS_ACTIVE).decrement(1.0); }

/// Record a processed frame.
#[cfg(feature = "metrics")]
pub fn inc_frames(direction: Direction) {
    metrics::counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
}

/// Record a failed send or receive.
#[cfg(feature = "metrics")]
pub fn inc_errors() { metrics::counter!(ERRORS_TOTAL).increment(1); }

#[cfg(not(feature = "metrics"))]
pub fn inc_connections() {}

#[cfg(not(feature = "metrics"))]
pub fn dec_connections() {}

#[cfg(not(feature = "metrics"))]
pub fn inc_frames(_direction: Direction) {}

#[cfg(not(feature = "metrics"))]
pub fn inc_errors() {}

//! Client connections to a message broker.
//!
//! [`StompClientBuilder`] opens a transport and performs the `CONNECT`
//! handshake. The resulting [`Connection`] sends frames directly and serves
//! receives through a single worker task that owns the read half, so frames
//! are decoded one at a time in arrival order whichever receive mode asked
//! for them:
//!
//! - [`Connection::receive`] waits for the next frame.
//! - [`Connection::receive_timeout`] waits at most a given duration.
//! - [`Connection::receive_async`] returns a [`PendingFrame`] to await or
//!   poll later.
//!
//! Shutdown is cooperative: [`Connection::close`] or a [`Closer`] signals the
//! worker, which abandons any read in progress.

mod builder;
mod config;
mod error;
mod handshake;
mod receiver;
mod runtime;
mod socket_option_methods;
mod tracing_config;
mod tracing_helpers;

pub use builder::StompClientBuilder;
pub use config::{
    ConnectOptions,
    RECEIVE_BUFFER_SIZE_OPTION,
    SocketOptions,
    TIMEOUT_OPTION,
    parse_pair,
};
pub use error::{ClientError, ConfigError, HandshakeError};
pub use receiver::{Closer, PendingFrame};
pub use runtime::{ClientStream, Connection};
pub use tracing_config::TracingConfig;

#[cfg(test)]
mod tests;

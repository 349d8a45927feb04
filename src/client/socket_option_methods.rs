//! Connection option shortcuts for [`StompClientBuilder`].
//!
//! Each method updates the builder's [`ConnectOptions`](super::ConnectOptions)
//! in place.

use std::time::Duration;

use super::{SocketOptions, StompClientBuilder};

impl StompClientBuilder {
    /// Replace the socket options applied before connecting.
    ///
    /// # Examples
    ///
    /// ```
    /// use stompframe::{StompClientBuilder, client::SocketOptions};
    ///
    /// let builder =
    ///     StompClientBuilder::new().socket_options(SocketOptions::default().nodelay(true));
    /// let _ = builder;
    /// ```
    #[must_use]
    pub fn socket_options(mut self, socket_options: SocketOptions) -> Self {
        self.options = self.options.socket_options(socket_options);
        self
    }

    /// Bound each wait for bytes from the broker.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use stompframe::StompClientBuilder;
    ///
    /// let builder = StompClientBuilder::new().read_timeout(Duration::from_millis(500));
    /// let _ = builder;
    /// ```
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.read_timeout(timeout);
        self
    }

    /// Configure `TCP_NODELAY`.
    #[must_use]
    pub fn nodelay(mut self, enabled: bool) -> Self {
        let socket = self.options.socket().nodelay(enabled);
        self.options = self.options.socket_options(socket);
        self
    }

    /// Configure `SO_KEEPALIVE`.
    #[must_use]
    pub fn keepalive(mut self, idle: Option<Duration>) -> Self {
        let socket = self.options.socket().keepalive(idle);
        self.options = self.options.socket_options(socket);
        self
    }

    /// Set the socket receive buffer size hint.
    #[must_use]
    pub fn recv_buffer_size(mut self, size: u32) -> Self {
        self.options = self.options.recv_buffer_size(size);
        self
    }
}

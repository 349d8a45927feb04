//! Connection options for broker clients.
//!
//! [`SocketOptions`] are applied to the socket before it connects.
//! [`ConnectOptions`] adds the settings that govern the established
//! connection and accepts the textual `key=value` form used on command lines.

use std::{io, time::Duration};

use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpSocket;

use super::error::ConfigError;

/// Key of the read timeout option, in milliseconds.
pub const TIMEOUT_OPTION: &str = "timeout";
/// Key of the receive buffer size option, in bytes.
pub const RECEIVE_BUFFER_SIZE_OPTION: &str = "receive-buffer-size";

/// Socket options applied before connecting.
///
/// Unset options leave the operating system default in place.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use stompframe::client::SocketOptions;
///
/// let options = SocketOptions::default()
///     .nodelay(true)
///     .keepalive(Some(Duration::from_secs(30)));
/// assert_ne!(options, SocketOptions::default());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SocketOptions {
    nodelay: Option<bool>,
    keepalive: Option<Option<Duration>>,
    send_buffer_size: Option<u32>,
    recv_buffer_size: Option<u32>,
}

impl SocketOptions {
    /// Configure `TCP_NODELAY`.
    #[must_use]
    pub fn nodelay(mut self, enabled: bool) -> Self {
        self.nodelay = Some(enabled);
        self
    }

    /// Enable `SO_KEEPALIVE` with the given idle time, or disable it with
    /// `None`.
    #[must_use]
    pub fn keepalive(mut self, idle: Option<Duration>) -> Self {
        self.keepalive = Some(idle);
        self
    }

    /// Configure the socket send buffer size.
    #[must_use]
    pub fn send_buffer_size(mut self, size: u32) -> Self {
        self.send_buffer_size = Some(size);
        self
    }

    /// Configure the socket receive buffer size.
    ///
    /// The value is a hint; the operating system may round or cap it.
    #[must_use]
    pub fn recv_buffer_size(mut self, size: u32) -> Self {
        self.recv_buffer_size = Some(size);
        self
    }

    /// The configured receive buffer size, if any.
    #[must_use]
    pub const fn recv_buffer_size_value(&self) -> Option<u32> { self.recv_buffer_size }

    pub(crate) fn apply(&self, socket: &TcpSocket) -> io::Result<()> {
        if let Some(enabled) = self.nodelay {
            socket.set_nodelay(enabled)?;
        }
        match self.keepalive {
            Some(Some(idle)) => {
                socket.set_keepalive(true)?;
                SockRef::from(socket).set_tcp_keepalive(&TcpKeepalive::new().with_time(idle))?;
            }
            Some(None) => socket.set_keepalive(false)?,
            None => {}
        }
        if let Some(size) = self.send_buffer_size {
            socket.set_send_buffer_size(size)?;
        }
        if let Some(size) = self.recv_buffer_size {
            socket.set_recv_buffer_size(size)?;
            log::info!(
                "receive buffer size set to {}",
                socket.recv_buffer_size()?
            );
        }
        Ok(())
    }
}

/// Settings for an established connection.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use stompframe::client::ConnectOptions;
///
/// let options = ConnectOptions::from_pairs([("timeout", "1500"), ("receive-buffer-size", "8192")])
///     .expect("valid options");
/// assert_eq!(options.read_timeout_value(), Some(Duration::from_millis(1500)));
/// assert_eq!(options.socket().recv_buffer_size_value(), Some(8192));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    read_timeout: Option<Duration>,
    socket: SocketOptions,
}

impl ConnectOptions {
    /// Bound each wait for more bytes from the broker.
    ///
    /// When the bound expires the pending receive fails with an I/O error of
    /// kind [`io::ErrorKind::TimedOut`]; the connection stays usable.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Replace the socket options.
    #[must_use]
    pub fn socket_options(mut self, socket: SocketOptions) -> Self {
        self.socket = socket;
        self
    }

    /// Set the socket receive buffer size hint.
    #[must_use]
    pub fn recv_buffer_size(mut self, size: u32) -> Self {
        self.socket = self.socket.recv_buffer_size(size);
        self
    }

    /// The configured read timeout, if any.
    #[must_use]
    pub const fn read_timeout_value(&self) -> Option<Duration> { self.read_timeout }

    /// The configured socket options.
    #[must_use]
    pub const fn socket(&self) -> &SocketOptions { &self.socket }

    /// Build options from textual `(key, value)` pairs.
    ///
    /// Recognised keys are `timeout` (milliseconds) and
    /// `receive-buffer-size` (bytes). Both take positive integers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownOption`] for any other key and
    /// [`ConfigError::InvalidValue`] when a value is not a positive integer.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        pairs
            .into_iter()
            .try_fold(Self::default(), |options, (key, value)| {
                options.with_pair(key.as_ref(), value.as_ref())
            })
    }

    /// Apply one textual option.
    ///
    /// # Errors
    ///
    /// See [`ConnectOptions::from_pairs`].
    pub fn with_pair(self, key: &str, value: &str) -> Result<Self, ConfigError> {
        match key {
            TIMEOUT_OPTION => {
                let millis: u64 = parse_positive(key, value)?;
                Ok(self.read_timeout(Duration::from_millis(millis)))
            }
            RECEIVE_BUFFER_SIZE_OPTION => Ok(self.recv_buffer_size(parse_positive(key, value)?)),
            _ => Err(ConfigError::UnknownOption {
                key: key.to_owned(),
            }),
        }
    }
}

/// Split `key=value` into its parts.
///
/// # Errors
///
/// Returns [`ConfigError::MalformedPair`] when `pair` contains no `=`.
pub fn parse_pair(pair: &str) -> Result<(String, String), ConfigError> {
    pair.split_once('=')
        .map(|(key, value)| (key.trim().to_owned(), value.trim().to_owned()))
        .ok_or_else(|| ConfigError::MalformedPair(pair.to_owned()))
}

fn parse_positive<N>(key: &str, value: &str) -> Result<N, ConfigError>
where
    N: std::str::FromStr + PartialOrd + Default,
{
    match value.parse::<N>() {
        Ok(parsed) if parsed > N::default() => Ok(parsed),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::rstest;

    use super::*;

    #[test]
    fn empty_pairs_yield_defaults() {
        let options = ConnectOptions::from_pairs(Vec::<(&str, &str)>::new()).expect("no options");
        assert_eq!(options, ConnectOptions::default());
    }

    #[test]
    fn later_pairs_override_earlier_ones() {
        let options = ConnectOptions::from_pairs([("timeout", "10"), ("timeout", "20")])
            .expect("valid options");
        assert_eq!(options.read_timeout_value(), Some(Duration::from_millis(20)));
    }

    #[rstest]
    #[case("timeout", "0")]
    #[case("timeout", "-5")]
    #[case("timeout", "soon")]
    #[case("receive-buffer-size", "0")]
    #[case("receive-buffer-size", "4294967296")]
    #[case("receive-buffer-size", "")]
    fn invalid_values_are_rejected(#[case] key: &str, #[case] value: &str) {
        let err = ConnectOptions::from_pairs([(key, value)]).expect_err("invalid value");
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: key.to_owned(),
                value: value.to_owned(),
            }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ConnectOptions::from_pairs([("heart-beat", "0,0")]).expect_err("unknown key");
        assert_eq!(
            err,
            ConfigError::UnknownOption {
                key: "heart-beat".to_owned()
            }
        );
    }

    #[rstest]
    #[case("timeout=100", ("timeout", "100"))]
    #[case(" timeout = 100 ", ("timeout", "100"))]
    #[case("key=a=b", ("key", "a=b"))]
    fn pairs_split_at_first_equals(#[case] raw: &str, #[case] expected: (&str, &str)) {
        let (key, value) = parse_pair(raw).expect("well-formed pair");
        assert_eq!((key.as_str(), value.as_str()), expected);
    }

    #[test]
    fn pair_without_equals_is_rejected() {
        assert_eq!(
            parse_pair("timeout"),
            Err(ConfigError::MalformedPair("timeout".to_owned()))
        );
    }
}

//! Builder for configuring and connecting to a broker.

use std::{io, net::SocketAddr};

use tokio::net::{TcpSocket, TcpStream};
use tracing::Instrument;

use super::{
    ClientError,
    ConnectOptions,
    Connection,
    handshake,
    runtime::{ClientStream, RuntimeSettings},
    tracing_config::TracingConfig,
    tracing_helpers::{connect_span, emit_timing_event, start_timer},
};
use crate::{
    codec::{DEFAULT_MAX_FRAME_LENGTH, clamp_frame_length},
    frame::{Command, Frame, FrameBuilder},
};

/// Builder for [`Connection`].
///
/// Collects credentials and connection settings, then opens the transport
/// and performs the `CONNECT` handshake.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use stompframe::{StompClientBuilder, client::ConnectOptions};
///
/// let builder = StompClientBuilder::new()
///     .login("guest")
///     .passcode("guest")
///     .host("/")
///     .options(ConnectOptions::default().read_timeout(Duration::from_secs(5)));
/// let _ = builder;
/// ```
#[derive(Clone, Debug)]
pub struct StompClientBuilder {
    pub(crate) login: Option<String>,
    pub(crate) passcode: Option<String>,
    pub(crate) host: Option<String>,
    pub(crate) options: ConnectOptions,
    pub(crate) max_frame_length: usize,
    pub(crate) tracing_config: TracingConfig,
}

impl StompClientBuilder {
    /// Create a builder with no credentials and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            login: None,
            passcode: None,
            host: None,
            options: ConnectOptions::default(),
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            tracing_config: TracingConfig::default(),
        }
    }

    /// Set the `login` header of the `CONNECT` frame.
    #[must_use]
    pub fn login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    /// Set the `passcode` header of the `CONNECT` frame.
    #[must_use]
    pub fn passcode(mut self, passcode: impl Into<String>) -> Self {
        self.passcode = Some(passcode.into());
        self
    }

    /// Set the `host` header naming the broker's virtual host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Replace the connection options.
    #[must_use]
    pub fn options(mut self, options: ConnectOptions) -> Self {
        self.options = options;
        self
    }

    /// Bound the size of frames sent and received.
    ///
    /// The value is clamped to
    /// [`MIN_FRAME_LENGTH`](crate::codec::MIN_FRAME_LENGTH)..=[`MAX_FRAME_LENGTH`](crate::codec::MAX_FRAME_LENGTH).
    #[must_use]
    pub fn max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = clamp_frame_length(max_frame_length);
        self
    }

    /// Configure tracing instrumentation for the connection.
    ///
    /// # Examples
    ///
    /// ```
    /// use stompframe::{StompClientBuilder, client::TracingConfig};
    ///
    /// let builder = StompClientBuilder::new()
    ///     .tracing_config(TracingConfig::default().with_all_timing(true));
    /// let _ = builder;
    /// ```
    #[must_use]
    pub fn tracing_config(mut self, config: TracingConfig) -> Self {
        self.tracing_config = config;
        self
    }

    /// The `CONNECT` frame this builder sends.
    #[must_use]
    pub fn connect_frame(&self) -> Frame {
        FrameBuilder::new()
            .header_opt("login", self.login.clone())
            .header_opt("passcode", self.passcode.clone())
            .header_opt("host", self.host.clone())
            .finish(Command::Connect)
    }

    /// Connect to `addr` and perform the handshake.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connect`] when the socket cannot be configured
    /// or connected, [`ClientError::Protocol`] when the broker does not
    /// answer with `CONNECTED`, and send or receive errors raised during the
    /// exchange.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::net::SocketAddr;
    ///
    /// use stompframe::{ClientError, StompClientBuilder};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), ClientError> {
    /// let addr: SocketAddr = "127.0.0.1:61613".parse().expect("valid socket address");
    /// let connection = StompClientBuilder::new().connect(addr).await?;
    /// connection.close().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(self, addr: SocketAddr) -> Result<Connection<TcpStream>, ClientError> {
        let span = connect_span(&self.tracing_config, &addr.to_string());
        let timer = start_timer(self.tracing_config.connect_timing);
        let result = async {
            let stream = self.open(addr).await.map_err(ClientError::Connect)?;
            self.handshake(stream).await
        }
        .instrument(span.clone())
        .await;
        record_connect(&span, &result);
        span.in_scope(|| emit_timing_event(timer));
        result
    }

    /// Resolve `host` and connect to the first address that accepts.
    ///
    /// # Errors
    ///
    /// As for [`StompClientBuilder::connect`]. When every resolved address
    /// refuses, the last transport error is returned.
    pub async fn connect_host(
        self,
        host: &str,
        port: u16,
    ) -> Result<Connection<TcpStream>, ClientError> {
        let peer = format!("{host}:{port}");
        let span = connect_span(&self.tracing_config, &peer);
        let timer = start_timer(self.tracing_config.connect_timing);
        let result = async {
            let mut last_err = io::Error::new(
                io::ErrorKind::NotFound,
                format!("{peer} did not resolve to any address"),
            );
            let addrs = tokio::net::lookup_host(&peer)
                .await
                .map_err(ClientError::Connect)?;
            for addr in addrs {
                match self.open(addr).await {
                    Ok(stream) => return self.handshake(stream).await,
                    Err(err) => {
                        log::debug!("connection to {addr} failed: {err}");
                        last_err = err;
                    }
                }
            }
            Err(ClientError::Connect(last_err))
        }
        .instrument(span.clone())
        .await;
        record_connect(&span, &result);
        span.in_scope(|| emit_timing_event(timer));
        result
    }

    /// Perform the handshake over an already open stream.
    ///
    /// Socket options do not apply; the read timeout does.
    ///
    /// # Errors
    ///
    /// As for [`StompClientBuilder::connect`], without the transport errors.
    pub async fn connect_stream<T>(self, stream: T) -> Result<Connection<T>, ClientError>
    where
        T: ClientStream,
    {
        let span = connect_span(&self.tracing_config, "stream");
        let timer = start_timer(self.tracing_config.connect_timing);
        let result = self.handshake(stream).instrument(span.clone()).await;
        record_connect(&span, &result);
        span.in_scope(|| emit_timing_event(timer));
        result
    }

    async fn open(&self, addr: SocketAddr) -> io::Result<TcpStream> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        self.options.socket().apply(&socket)?;
        socket.connect(addr).await
    }

    async fn handshake<T>(&self, stream: T) -> Result<Connection<T>, ClientError>
    where
        T: ClientStream,
    {
        let settings = RuntimeSettings {
            max_frame_length: self.max_frame_length,
            read_timeout: self.options.read_timeout_value(),
            tracing_config: self.tracing_config.clone(),
        };
        handshake::perform(Connection::start(stream, settings), &self.connect_frame()).await
    }
}

impl Default for StompClientBuilder {
    fn default() -> Self { Self::new() }
}

fn record_connect<T>(span: &tracing::Span, result: &Result<Connection<T>, ClientError>)
where
    T: ClientStream,
{
    match result {
        Ok(_) => span.record("result", "ok"),
        Err(err) => span.record("result", tracing::field::display(err)),
    };
}

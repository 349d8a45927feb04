//! Connection runtime: sending, the three receive modes and shutdown.

use std::{fmt, time::Duration};

use futures::SinkExt;
use tokio::{
    io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf},
    net::TcpStream,
    sync::{Mutex, mpsc, oneshot},
    task::JoinHandle,
    time::Instant,
};
use tokio_util::{codec::FramedWrite, sync::CancellationToken};
use tracing::Instrument;

use super::{
    ClientError,
    receiver::{self, Closer, FrameResult, PendingFrame, Reply},
    tracing_config::TracingConfig,
    tracing_helpers::{close_span, emit_timing_event, receive_span, send_span, start_timer},
};
use crate::{
    codec::{StompCodec, encoded_len},
    frame::{AckMode, Command, Frame},
    metrics,
};

/// Byte streams a [`Connection`] can run over.
pub trait ClientStream: AsyncRead + AsyncWrite + Send + 'static {}
impl<T> ClientStream for T where T: AsyncRead + AsyncWrite + Send + 'static {}

/// Settings fixed when a connection starts.
#[derive(Clone, Debug, Default)]
pub(crate) struct RuntimeSettings {
    pub(crate) max_frame_length: usize,
    pub(crate) read_timeout: Option<Duration>,
    pub(crate) tracing_config: TracingConfig,
}

/// A live connection to a broker.
///
/// `Connection` owns the write half of its stream. The read half belongs to
/// a worker task that serves receives one at a time, so receives may be
/// issued concurrently from several tasks through a shared reference without
/// corrupting the stream. Frames are delivered in the order the broker wrote
/// them.
///
/// Send and receive failures end the call that hit them; the connection
/// stays usable unless the error is [`ClientError::Closed`] or the transport
/// itself failed.
///
/// Dropping a connection signals shutdown to its worker; [`Connection::close`]
/// additionally flushes the write half and waits for the worker to finish.
///
/// # Examples
///
/// ```no_run
/// use std::net::SocketAddr;
///
/// use stompframe::{AckMode, ClientError, StompClientBuilder};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), ClientError> {
/// let addr: SocketAddr = "127.0.0.1:61613".parse().expect("valid socket address");
/// let connection = StompClientBuilder::new()
///     .login("guest")
///     .passcode("guest")
///     .connect(addr)
///     .await?;
/// connection.subscribe("0", "/queue/orders", AckMode::Auto).await?;
/// connection.send_to("/queue/orders", "hello").await?;
/// let frame = connection.receive().await?;
/// println!("{:?}", frame.body_text());
/// connection.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Connection<T = TcpStream>
where
    T: ClientStream,
{
    writer: Mutex<FramedWrite<WriteHalf<T>, StompCodec>>,
    requests: mpsc::Sender<Reply>,
    shutdown: CancellationToken,
    worker: Option<JoinHandle<()>>,
    tracing_config: TracingConfig,
    connected: Option<Frame>,
}

impl<T> fmt::Debug for Connection<T>
where
    T: ClientStream,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.shutdown.is_cancelled())
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl<T> Connection<T>
where
    T: ClientStream,
{
    /// Split `stream` and start the receiver worker.
    pub(crate) fn start(stream: T, settings: RuntimeSettings) -> Self {
        let (read_half, write_half): (ReadHalf<T>, WriteHalf<T>) = tokio::io::split(stream);
        let shutdown = CancellationToken::new();
        let (requests, worker) = receiver::spawn(
            read_half,
            StompCodec::new(settings.max_frame_length),
            settings.read_timeout,
            shutdown.clone(),
        );
        metrics::inc_connections();
        Self {
            writer: Mutex::new(FramedWrite::new(
                write_half,
                StompCodec::new(settings.max_frame_length),
            )),
            requests,
            shutdown,
            worker: Some(worker),
            tracing_config: settings.tracing_config,
            connected: None,
        }
    }

    pub(crate) fn set_connected(&mut self, frame: Frame) { self.connected = Some(frame); }

    /// The `CONNECTED` frame the broker answered the handshake with.
    #[must_use]
    pub fn connected_frame(&self) -> Option<&Frame> { self.connected.as_ref() }

    /// Returns true once shutdown has been signalled.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.shutdown.is_cancelled() }

    /// A handle that can shut this connection down from another task.
    #[must_use]
    pub fn closer(&self) -> Closer { Closer::new(self.shutdown.clone()) }

    /// Encode `frame`, write it and flush.
    ///
    /// Failures are reported, never retried.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after shutdown,
    /// [`ClientError::Codec`] when the frame exceeds the maximum frame length
    /// and [`ClientError::Io`] when the write fails.
    pub async fn send(&self, frame: &Frame) -> Result<(), ClientError> {
        let span = send_span(
            &self.tracing_config,
            frame.command().as_str(),
            encoded_len(frame),
        );
        let timer = start_timer(self.tracing_config.send_timing);
        let result = async {
            if self.is_closed() {
                return Err(ClientError::Closed);
            }
            let mut writer = self.writer.lock().await;
            writer.send(frame).await.map_err(ClientError::from)
        }
        .instrument(span.clone())
        .await;
        match &result {
            Ok(()) => metrics::inc_frames(metrics::Direction::Outbound),
            Err(err) => {
                log::warn!("failed to send {} frame: {err}", frame.command());
                metrics::inc_errors();
            }
        }
        span.in_scope(|| emit_timing_event(timer));
        result
    }

    /// Send a text message to `destination`.
    ///
    /// # Errors
    ///
    /// See [`Connection::send`].
    pub async fn send_to(
        &self,
        destination: &str,
        body: impl Into<String>,
    ) -> Result<(), ClientError> {
        self.send(&Frame::send(destination, body)).await
    }

    /// Subscribe to `destination` under the subscription `id`.
    ///
    /// # Errors
    ///
    /// See [`Connection::send`].
    pub async fn subscribe(
        &self,
        id: &str,
        destination: &str,
        ack: AckMode,
    ) -> Result<(), ClientError> {
        self.send(&Frame::subscribe(id, destination, ack)).await
    }

    /// Cancel the subscription `id`.
    ///
    /// # Errors
    ///
    /// See [`Connection::send`].
    pub async fn unsubscribe(&self, id: &str) -> Result<(), ClientError> {
        self.send(&Frame::unsubscribe(id)).await
    }

    /// Acknowledge a `MESSAGE` frame.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAcknowledgeable`] when `message` is not a
    /// `MESSAGE` carrying `subscription` and `message-id` headers, otherwise
    /// see [`Connection::send`].
    pub async fn ack(&self, message: &Frame) -> Result<(), ClientError> {
        let (subscription, message_id) = acknowledgement_target(message)?;
        self.send(&Frame::ack(subscription, message_id, None)).await
    }

    /// Reject a `MESSAGE` frame.
    ///
    /// # Errors
    ///
    /// As for [`Connection::ack`].
    pub async fn nack(&self, message: &Frame) -> Result<(), ClientError> {
        let (subscription, message_id) = acknowledgement_target(message)?;
        self.send(&Frame::nack(subscription, message_id, None)).await
    }

    /// Wait for the next frame.
    ///
    /// The call suspends until a frame arrives, the configured read timeout
    /// expires, or the connection shuts down.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Codec`] for malformed or truncated frames,
    /// [`ClientError::Io`] for transport failures including read timeouts,
    /// [`ClientError::Disconnected`] when the broker closed the stream and
    /// [`ClientError::Closed`] after shutdown.
    pub async fn receive(&self) -> Result<Frame, ClientError> {
        let span = receive_span(&self.tracing_config, "wait");
        let timer = start_timer(self.tracing_config.receive_timing);
        let result = async { self.submit().await?.await }
            .instrument(span.clone())
            .await;
        finish_receive(&span, &result, timer);
        result
    }

    /// Wait at most `limit` for the next frame.
    ///
    /// If the limit expires the call fails with [`ClientError::Timeout`]. A
    /// frame that arrives afterwards is not lost: it is returned by the next
    /// receive on this connection.
    /// A limit too large to add to the current instant, such as
    /// [`Duration::MAX`], waits like [`Connection::receive`].
    ///
    /// # Errors
    ///
    /// As for [`Connection::receive`], plus [`ClientError::Timeout`].
    pub async fn receive_timeout(&self, limit: Duration) -> Result<Frame, ClientError> {
        let span = receive_span(&self.tracing_config, "timeout");
        let timer = start_timer(self.tracing_config.receive_timing);
        let deadline = Instant::now().checked_add(limit);
        let result = async {
            let Some(deadline) = deadline else {
                // Past the clock's range: no deadline to enforce.
                return self.submit().await?.await;
            };
            let mut pending = tokio::time::timeout_at(deadline, self.submit())
                .await
                .map_err(|_| ClientError::Timeout(limit))??;
            match tokio::time::timeout_at(deadline, &mut pending).await {
                Ok(result) => result,
                Err(_) => pending
                    .abandon()
                    .unwrap_or(Err(ClientError::Timeout(limit))),
            }
        }
        .instrument(span.clone())
        .await;
        finish_receive(&span, &result, timer);
        result
    }

    /// Submit a receive and return without waiting for the frame.
    ///
    /// The returned [`PendingFrame`] resolves to the frame when awaited and
    /// can be checked without blocking with [`PendingFrame::try_take`].
    /// Receives are served in submission order. The call itself waits only
    /// while another receive is already queued.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Closed`] after shutdown.
    pub async fn receive_async(&self) -> Result<PendingFrame, ClientError> {
        let span = receive_span(&self.tracing_config, "async");
        self.submit().instrument(span).await
    }

    /// Send `DISCONNECT` and close the connection.
    ///
    /// With a `receipt`, frames are read until the broker's `RECEIPT` for it
    /// arrives; other frames read in the meantime are discarded.
    ///
    /// # Errors
    ///
    /// Returns the first send, receive or close failure, and
    /// [`ClientError::Broker`] when the broker answers with `ERROR` before
    /// the receipt. The connection is closed in every case.
    pub async fn disconnect(self, receipt: Option<&str>) -> Result<(), ClientError> {
        self.send(&Frame::disconnect(receipt)).await?;
        if let Some(receipt) = receipt {
            loop {
                let frame = self.receive().await?;
                if frame.is(Command::Receipt) && frame.header("receipt-id") == Some(receipt) {
                    break;
                }
                if frame.is(Command::Error) {
                    log::warn!("broker reported an error while awaiting receipt {receipt}");
                    self.close_quietly().await;
                    return Err(ClientError::Broker(Box::new(frame)));
                }
                log::debug!("discarding {} frame while awaiting receipt", frame.command());
            }
        }
        self.close().await
    }

    /// Shut the connection down.
    ///
    /// Signals shutdown, which interrupts any receive in progress, then
    /// flushes and closes the write half and waits for the receiver worker
    /// to stop.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when flushing or closing the write half
    /// fails.
    pub async fn close(mut self) -> Result<(), ClientError> {
        let span = close_span(&self.tracing_config);
        let timer = start_timer(self.tracing_config.close_timing);
        let result = async {
            self.shutdown.cancel();
            let closed = SinkExt::<Frame>::close(self.writer.get_mut()).await;
            if let Some(worker) = self.worker.take() {
                if let Err(err) = worker.await {
                    log::error!("receiver worker failed: {err}");
                }
            }
            closed.map_err(ClientError::from)
        }
        .instrument(span.clone())
        .await;
        span.in_scope(|| emit_timing_event(timer));
        result
    }

    /// Shut the connection down, logging instead of returning failures.
    ///
    /// Suited to best-effort teardown paths.
    pub async fn close_quietly(self) {
        if let Err(err) = self.close().await {
            log::warn!("failed to close connection: {err}");
        }
    }

    async fn submit(&self) -> Result<PendingFrame, ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let (reply, pending) = oneshot::channel::<FrameResult>();
        self.requests
            .send(reply)
            .await
            .map_err(|_| ClientError::Closed)?;
        Ok(PendingFrame::new(pending))
    }
}

impl<T> Drop for Connection<T>
where
    T: ClientStream,
{
    fn drop(&mut self) {
        self.shutdown.cancel();
        metrics::dec_connections();
    }
}

fn finish_receive(span: &tracing::Span, result: &FrameResult, timer: Option<std::time::Instant>) {
    match result {
        Ok(frame) => {
            span.record("frame.command", frame.command().as_str());
            span.record("result", "ok");
        }
        Err(err) => {
            span.record("result", tracing::field::display(err));
        }
    }
    span.in_scope(|| emit_timing_event(timer));
}

fn acknowledgement_target(message: &Frame) -> Result<(&str, &str), ClientError> {
    match (message.subscription(), message.message_id()) {
        (Some(subscription), Some(message_id)) => Ok((subscription, message_id)),
        _ => Err(ClientError::NotAcknowledgeable(message.command())),
    }
}


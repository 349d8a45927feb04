//! Receiver worker owning the read half of a connection.
//!
//! Every receive mode is a request to one worker task per connection. The
//! worker is the only code that touches the read half, so at most one decode
//! is ever in flight. Requests queue in a single-slot channel and are served
//! in order.
//!
//! When a requester stops waiting (a timed receive expired or a
//! [`PendingFrame`] was abandoned) the worker keeps the result it produced
//! and hands it to the next request instead of dropping it.

use std::{
    future::Future,
    io,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use bytes::BytesMut;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::{codec::Decoder, sync::CancellationToken};

use super::ClientError;
use crate::{codec::StompCodec, frame::Frame, metrics};

/// Outcome of one receive request.
pub(crate) type FrameResult = Result<Frame, ClientError>;

/// Reply channel carried by each receive request.
pub(crate) type Reply = oneshot::Sender<FrameResult>;

const INITIAL_READ_BUFFER_CAPACITY: usize = 8 * 1024;
const MIN_READ_SPACE: usize = 1024;

/// A receive submitted to the worker and not yet collected.
///
/// `PendingFrame` is a future resolving to the next frame. It can also be
/// polled without blocking through [`PendingFrame::try_take`].
///
/// Dropping it before the worker has answered leaves the frame on the
/// connection for the next receive. Dropping it after the answer arrived
/// discards that answer.
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
/// let pending = connection.receive_async().await?;
/// // ... do other work ...
/// let frame = pending.await?;
/// println!("{:?}", frame.command());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
#[must_use = "a pending receive does nothing unless awaited or polled"]
pub struct PendingFrame {
    reply: oneshot::Receiver<FrameResult>,
}

impl PendingFrame {
    pub(crate) fn new(reply: oneshot::Receiver<FrameResult>) -> Self { Self { reply } }

    /// Take the result if the worker has produced it.
    ///
    /// Returns `None` while the receive is still in progress. Once a result
    /// has been taken, later calls report [`ClientError::Closed`].
    pub fn try_take(&mut self) -> Option<FrameResult> {
        match self.reply.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(ClientError::Closed)),
        }
    }

    /// Stop waiting and return the result only if it has already arrived.
    ///
    /// After this call the worker can no longer deliver to this handle, so a
    /// result it produces later is kept for the next receive.
    pub(crate) fn abandon(mut self) -> Option<FrameResult> {
        self.reply.close();
        self.reply.try_recv().ok()
    }
}

impl Future for PendingFrame {
    type Output = FrameResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.reply)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(ClientError::Closed)))
    }
}

/// Handle that shuts a connection down from another task.
///
/// Cancelling interrupts a read in progress: the pending receive and any
/// queued behind it fail with [`ClientError::Closed`]. The connection still
/// has to be closed or dropped by its owner to release the socket.
#[derive(Clone, Debug)]
pub struct Closer {
    shutdown: CancellationToken,
}

impl Closer {
    pub(crate) fn new(shutdown: CancellationToken) -> Self { Self { shutdown } }

    /// Signal shutdown.
    pub fn close(&self) { self.shutdown.cancel(); }

    /// Returns true once shutdown has been signalled.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.shutdown.is_cancelled() }
}

/// Spawn the worker for `reader` and return its request queue.
pub(crate) fn spawn<R>(
    reader: R,
    codec: StompCodec,
    read_timeout: Option<Duration>,
    shutdown: CancellationToken,
) -> (mpsc::Sender<Reply>, JoinHandle<()>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (requests_tx, requests_rx) = mpsc::channel(1);
    let worker = Receiver {
        reader,
        codec,
        buffer: BytesMut::with_capacity(INITIAL_READ_BUFFER_CAPACITY),
        read_timeout,
        shutdown,
        stash: None,
        eof: false,
    };
    (requests_tx, tokio::spawn(worker.run(requests_rx)))
}

struct Receiver<R> {
    reader: R,
    codec: StompCodec,
    buffer: BytesMut,
    read_timeout: Option<Duration>,
    shutdown: CancellationToken,
    /// Result produced for a requester that stopped waiting.
    stash: Option<FrameResult>,
    eof: bool,
}

impl<R> Receiver<R>
where
    R: AsyncRead + Unpin,
{
    async fn run(mut self, mut requests: mpsc::Receiver<Reply>) {
        log::debug!("receiver worker started");
        loop {
            let reply = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                request = requests.recv() => match request {
                    Some(reply) => reply,
                    None => break,
                },
            };
            // The requester may have given up while queued; leave the stream
            // untouched for the next one.
            if reply.is_closed() {
                continue;
            }
            let result = match self.stash.take() {
                Some(result) => result,
                None => {
                    let result = self.next_frame().await;
                    record(&result);
                    result
                }
            };
            if let Err(unclaimed) = reply.send(result) {
                log::debug!("receive abandoned; keeping result for the next request");
                self.stash = Some(unclaimed);
            }
        }

        requests.close();
        while let Some(reply) = requests.recv().await {
            // Requester may already be gone.
            let _ = reply.send(Err(ClientError::Closed));
        }
        log::debug!("receiver worker stopped");
    }

    async fn next_frame(&mut self) -> FrameResult {
        loop {
            if let Some(frame) = self.codec.decode(&mut self.buffer)? {
                return Ok(frame);
            }
            if self.eof {
                return self
                    .codec
                    .decode_eof(&mut self.buffer)?
                    .ok_or(ClientError::Disconnected);
            }
            if self.fill().await? == 0 {
                self.eof = true;
            }
        }
    }

    /// Read more bytes, giving up on shutdown or when the read timeout
    /// expires.
    async fn fill(&mut self) -> Result<usize, ClientError> {
        let Self {
            reader,
            buffer,
            read_timeout,
            shutdown,
            ..
        } = self;
        if buffer.capacity() - buffer.len() < MIN_READ_SPACE {
            buffer.reserve(INITIAL_READ_BUFFER_CAPACITY);
        }
        let read = async move {
            match *read_timeout {
                Some(limit) => tokio::time::timeout(limit, reader.read_buf(buffer))
                    .await
                    .unwrap_or_else(|_| {
                        Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!("no data received within {limit:?}"),
                        ))
                    }),
                None => reader.read_buf(buffer).await,
            }
        };
        tokio::select! {
            biased;
            () = shutdown.cancelled() => Err(ClientError::Closed),
            result = read => Ok(result?),
        }
    }
}

fn record(result: &FrameResult) {
    match result {
        Ok(_) => metrics::inc_frames(metrics::Direction::Inbound),
        Err(ClientError::Closed | ClientError::Disconnected) => {}
        Err(err) => {
            log::warn!("receive failed: {err}");
            metrics::inc_errors();
        }
    }
}

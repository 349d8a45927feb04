//! A scripted broker peer on a loopback TCP port.

use std::{io, net::SocketAddr, time::Duration};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use stompframe::{Command, Frame, StompCodec};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tokio_util::codec::Framed;

use crate::frames;

/// One action in a broker script.
#[derive(Clone, Debug)]
pub enum Step {
    /// Encode and write a frame.
    Frame(Frame),
    /// Write bytes exactly as given.
    Raw(Bytes),
    /// Write bytes in `chunk`-sized pieces, pausing `delay` after each.
    Slow {
        /// Bytes to write.
        bytes: Bytes,
        /// Size of each write.
        chunk: usize,
        /// Pause after each write.
        delay: Duration,
    },
    /// Do nothing for a while.
    Pause(Duration),
    /// Wait for the client to send a frame with this command.
    Expect(Command),
    /// Close the write side of the connection.
    Shutdown,
}

impl Step {
    /// Write `frames` back to back as a slow stream.
    #[must_use]
    pub fn slow_frames(frames: &[Frame], chunk: usize, delay: Duration) -> Self {
        let bytes = frames.iter().flat_map(Frame::to_bytes).collect::<Vec<u8>>();
        Self::Slow {
            bytes: Bytes::from(bytes),
            chunk,
            delay,
        }
    }
}

/// Listener accepting a single client.
#[derive(Debug)]
pub struct MockBroker {
    listener: TcpListener,
    addr: SocketAddr,
    handshake_reply: Option<Frame>,
}

impl MockBroker {
    /// Bind to an ephemeral loopback port. The broker answers `CONNECT`
    /// with a `CONNECTED` frame unless told otherwise.
    ///
    /// # Errors
    ///
    /// Returns any error raised while binding.
    pub async fn bind() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        Ok(Self {
            listener,
            addr,
            handshake_reply: Some(frames::connected()),
        })
    }

    /// Answer `CONNECT` with `reply`, or with nothing when `None`.
    #[must_use]
    pub fn handshake_reply(mut self, reply: Option<Frame>) -> Self {
        self.handshake_reply = reply;
        self
    }

    /// Address clients should connect to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr { self.addr }

    /// Accept one client and read its `CONNECT` frame, answering it as
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns accept, decode or write errors, and
    /// [`io::ErrorKind::InvalidData`] when the first frame is not `CONNECT`.
    pub async fn accept(self) -> io::Result<BrokerSession> {
        let (stream, _) = self.listener.accept().await?;
        let mut session = BrokerSession {
            framed: Framed::new(stream, StompCodec::default()),
            connect: None,
        };
        let connect = session.expect(Command::Connect).await?;
        session.connect = Some(connect);
        if let Some(reply) = &self.handshake_reply {
            session.write_frame(reply).await?;
        }
        Ok(session)
    }

    /// Accept one client in the background and play `script` to it.
    ///
    /// The task resolves to the session so tests can inspect what the
    /// client sent.
    pub fn spawn(self, script: Vec<Step>) -> JoinHandle<io::Result<BrokerSession>> {
        tokio::spawn(async move {
            let mut session = self.accept().await?;
            session.play(script).await?;
            Ok(session)
        })
    }
}

/// The broker side of one accepted client connection.
#[derive(Debug)]
pub struct BrokerSession {
    framed: Framed<TcpStream, StompCodec>,
    connect: Option<Frame>,
}

impl BrokerSession {
    /// The `CONNECT` frame the client opened with.
    #[must_use]
    pub fn connect_frame(&self) -> Option<&Frame> { self.connect.as_ref() }

    /// Read the next frame the client sent, or `None` once it closed the
    /// stream.
    ///
    /// # Errors
    ///
    /// Returns decode and transport errors.
    pub async fn read_frame(&mut self) -> io::Result<Option<Frame>> {
        self.framed.next().await.transpose().map_err(io::Error::from)
    }

    /// Read the next frame and check its command.
    ///
    /// # Errors
    ///
    /// As for [`BrokerSession::read_frame`], plus
    /// [`io::ErrorKind::UnexpectedEof`] when the client closed first and
    /// [`io::ErrorKind::InvalidData`] when the command differs.
    pub async fn expect(&mut self, command: Command) -> io::Result<Frame> {
        let frame = self.read_frame().await?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("client closed before sending {command}"),
            )
        })?;
        if frame.is(command) {
            Ok(frame)
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("expected {command}, got {}", frame.command()),
            ))
        }
    }

    /// Encode and write `frame`.
    ///
    /// # Errors
    ///
    /// Returns encode and transport errors.
    pub async fn write_frame(&mut self, frame: &Frame) -> io::Result<()> {
        self.framed.send(frame).await.map_err(io::Error::from)
    }

    /// Write `bytes` verbatim.
    ///
    /// # Errors
    ///
    /// Returns transport errors.
    pub async fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stream = self.framed.get_mut();
        stream.write_all(bytes).await?;
        stream.flush().await
    }

    /// Run every step of `script` in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step and returns its error.
    pub async fn play(&mut self, script: Vec<Step>) -> io::Result<()> {
        for step in script {
            match step {
                Step::Frame(frame) => self.write_frame(&frame).await?,
                Step::Raw(bytes) => self.write_raw(&bytes).await?,
                Step::Slow {
                    bytes,
                    chunk,
                    delay,
                } => {
                    for piece in bytes.chunks(chunk.max(1)) {
                        self.write_raw(piece).await?;
                        tokio::time::sleep(delay).await;
                    }
                }
                Step::Pause(delay) => tokio::time::sleep(delay).await,
                Step::Expect(command) => {
                    self.expect(command).await?;
                }
                Step::Shutdown => self.framed.get_mut().shutdown().await?,
            }
        }
        Ok(())
    }
}

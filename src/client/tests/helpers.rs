//! Shared helpers for client tests.
//!
//! The broker side of each test is a [`Framed`] duplex stream driven by the
//! same codec as the client.

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use tokio::{
    io::{AsyncWriteExt, DuplexStream},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tokio_util::codec::Framed;

use crate::{
    client::{Connection, StompClientBuilder},
    codec::StompCodec,
    frame::{Command, Frame},
};

const DUPLEX_CAPACITY: usize = 64 * 1024;

/// Broker end of an in-memory connection.
pub struct TestBroker {
    framed: Framed<DuplexStream, StompCodec>,
}

impl TestBroker {
    /// Read the next frame the client sent.
    pub async fn read_frame(&mut self) -> Frame {
        self.framed
            .next()
            .await
            .expect("client stream open")
            .expect("client sent a valid frame")
    }

    /// Write one frame to the client.
    pub async fn write_frame(&mut self, frame: &Frame) {
        self.framed.send(frame).await.expect("write frame");
    }

    /// Write raw bytes to the client.
    pub async fn write_raw(&mut self, bytes: &[u8]) {
        let stream = self.framed.get_mut();
        stream.write_all(bytes).await.expect("write raw bytes");
        stream.flush().await.expect("flush raw bytes");
    }
}

/// Frame a broker would deliver for a subscription.
pub fn message(subscription: &str, message_id: &str, body: &str) -> Frame {
    Frame::builder()
        .command(Command::Message)
        .header("subscription", subscription)
        .header("message-id", message_id)
        .header("destination", "/queue/test")
        .text(body)
        .build()
        .expect("command is set")
}

/// Run the handshake for `builder` against an in-memory broker answering
/// with `reply`.
///
/// Returns the client's handshake result together with the broker end and
/// the `CONNECT` frame the broker read.
pub async fn handshake_with(
    builder: StompClientBuilder,
    reply: Option<Frame>,
) -> (
    Result<Connection<DuplexStream>, crate::client::ClientError>,
    TestBroker,
    Frame,
) {
    let (client_io, broker_io) = tokio::io::duplex(DUPLEX_CAPACITY);
    let mut broker = TestBroker {
        framed: Framed::new(broker_io, StompCodec::default()),
    };
    let client = tokio::spawn(builder.connect_stream(client_io));
    let connect = broker.read_frame().await;
    match reply {
        Some(reply) => broker.write_frame(&reply).await,
        None => broker
            .framed
            .get_mut()
            .shutdown()
            .await
            .expect("close broker write side"),
    }
    let result = client.await.expect("join handshake task");
    (result, broker, connect)
}

/// Connect a client with `builder` to an in-memory broker that accepts the
/// handshake.
pub async fn connected(builder: StompClientBuilder) -> (Connection<DuplexStream>, TestBroker) {
    let (result, broker, _) =
        handshake_with(builder, Some(Frame::bare(Command::Connected))).await;
    (result.expect("handshake succeeds"), broker)
}

/// Connect with default settings.
pub async fn connected_default() -> (Connection<DuplexStream>, TestBroker) {
    connected(StompClientBuilder::new()).await
}

/// Bind a TCP listener and accept a single connection in the background.
pub async fn spawn_listener() -> (SocketAddr, JoinHandle<TcpStream>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("listener addr");
    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept client");
        stream
    });
    (addr, accept)
}

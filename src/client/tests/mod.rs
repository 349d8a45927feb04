//! Unit tests for the client runtime.

mod helpers;

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use helpers::{connected, connected_default, handshake_with, message, spawn_listener};
use rstest::rstest;
use socket2::SockRef;
use tokio_util::codec::Framed;

use super::*;
use crate::{
    codec::{MIN_FRAME_LENGTH, StompCodec},
    frame::{AckMode, Command, Frame, FrameBuilder},
};

const KEEPALIVE_IDLE: Duration = Duration::from_secs(30);
const BUFFER_SIZE: u32 = 256 * 1024;

#[tokio::test]
async fn handshake_sends_credentials_and_keeps_connected_frame() {
    let reply = FrameBuilder::new()
        .command(Command::Connected)
        .header("version", "1.2")
        .build()
        .expect("command is set");
    let builder = StompClientBuilder::new()
        .login("guest")
        .passcode("secret")
        .host("/vhost");

    let (result, _broker, connect) = handshake_with(builder, Some(reply.clone())).await;
    let connection = result.expect("handshake succeeds");

    assert_eq!(connect.command(), Command::Connect);
    assert_eq!(connect.header("login"), Some("guest"));
    assert_eq!(connect.header("passcode"), Some("secret"));
    assert_eq!(connect.header("host"), Some("/vhost"));
    assert_eq!(connection.connected_frame(), Some(&reply));
}

#[tokio::test]
async fn handshake_without_credentials_sends_bare_connect() {
    let (result, _broker, connect) =
        handshake_with(StompClientBuilder::new(), Some(Frame::bare(Command::Connected))).await;
    result.expect("handshake succeeds");
    assert!(connect.headers().is_empty());
}

#[tokio::test]
async fn handshake_rejected_by_error_frame() {
    let reply = FrameBuilder::new()
        .command(Command::Error)
        .header("message", "access refused")
        .build()
        .expect("command is set");

    let (result, _broker, _) = handshake_with(StompClientBuilder::new(), Some(reply.clone())).await;
    let err = result.expect_err("rejected");

    let ClientError::Protocol(HandshakeError::Rejected(frame)) = err else {
        panic!("expected rejection, got {err:?}");
    };
    assert_eq!(*frame, reply);
}

#[rstest]
#[case(Command::Message)]
#[case(Command::Receipt)]
#[tokio::test]
async fn handshake_unexpected_reply(#[case] command: Command) {
    let (result, _broker, _) =
        handshake_with(StompClientBuilder::new(), Some(Frame::bare(command))).await;
    let err = result.expect_err("unexpected reply");
    assert!(
        matches!(err, ClientError::Protocol(HandshakeError::Unexpected(c)) if c == command),
        "got {err:?}"
    );
}

#[tokio::test]
async fn handshake_without_reply_reports_no_response() {
    let (result, _broker, _) = handshake_with(StompClientBuilder::new(), None).await;
    let err = result.expect_err("no reply");
    assert!(
        matches!(err, ClientError::Protocol(HandshakeError::NoResponse)),
        "got {err:?}"
    );
}

#[tokio::test]
async fn connect_reports_refused_transport() {
    let (addr, accept) = spawn_listener().await;
    accept.abort();
    // Give the aborted task a moment to drop its listener.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let err = StompClientBuilder::new()
        .connect(addr)
        .await
        .expect_err("nothing listening");
    assert!(matches!(err, ClientError::Connect(_)), "got {err:?}");
}

#[tokio::test]
async fn connects_over_tcp_with_socket_options() {
    let (addr, accept) = spawn_listener().await;
    let broker = tokio::spawn(async move {
        let stream = accept.await.expect("join accept task");
        let mut framed = Framed::new(stream, StompCodec::default());
        let connect = framed
            .next()
            .await
            .expect("client stream open")
            .expect("valid CONNECT");
        framed
            .send(Frame::bare(Command::Connected))
            .await
            .expect("reply");
        (framed, connect)
    });

    let connection = StompClientBuilder::new()
        .nodelay(true)
        .keepalive(Some(KEEPALIVE_IDLE))
        .recv_buffer_size(BUFFER_SIZE)
        .connect(addr)
        .await
        .expect("connect");
    let (_framed, connect) = broker.await.expect("join broker");

    assert_eq!(connect.command(), Command::Connect);
    assert_eq!(
        connection.connected_frame().map(Frame::command),
        Some(Command::Connected)
    );
    connection.close().await.expect("close");
}

#[test]
fn socket_options_apply_to_unconnected_socket() {
    let socket = tokio::net::TcpSocket::new_v4().expect("create socket");
    SocketOptions::default()
        .nodelay(true)
        .keepalive(Some(KEEPALIVE_IDLE))
        .recv_buffer_size(BUFFER_SIZE)
        .apply(&socket)
        .expect("apply options");

    assert!(socket.nodelay().expect("query TCP_NODELAY"));
    let sock_ref = SockRef::from(&socket);
    assert!(sock_ref.keepalive().expect("query SO_KEEPALIVE"));
    assert!(
        sock_ref.recv_buffer_size().expect("query SO_RCVBUF") >= BUFFER_SIZE as usize,
        "SO_RCVBUF should be at least the requested value"
    );
}

#[tokio::test]
async fn send_helpers_write_expected_frames() {
    let (connection, mut broker) = connected_default().await;

    connection
        .subscribe("sub-0", "/queue/a", AckMode::ClientIndividual)
        .await
        .expect("subscribe");
    connection.send_to("/queue/a", "hello").await.expect("send");
    connection.unsubscribe("sub-0").await.expect("unsubscribe");

    let subscribe = broker.read_frame().await;
    assert_eq!(subscribe.command(), Command::Subscribe);
    assert_eq!(subscribe.header("ack"), Some("client-individual"));
    let send = broker.read_frame().await;
    assert_eq!(send, Frame::send("/queue/a", "hello"));
    let unsubscribe = broker.read_frame().await;
    assert_eq!(unsubscribe.header("id"), Some("sub-0"));
}

#[tokio::test]
async fn ack_uses_message_headers() {
    let (connection, mut broker) = connected_default().await;
    let delivered = message("sub-1", "m-7", "payload");

    connection.ack(&delivered).await.expect("ack");
    connection.nack(&delivered).await.expect("nack");

    assert_eq!(
        broker.read_frame().await,
        Frame::ack("sub-1", "m-7", None)
    );
    assert_eq!(
        broker.read_frame().await,
        Frame::nack("sub-1", "m-7", None)
    );
}

#[tokio::test]
async fn ack_rejects_non_message_frames() {
    let (connection, _broker) = connected_default().await;
    let err = connection
        .ack(&Frame::bare(Command::Receipt))
        .await
        .expect_err("not a message");
    assert!(
        matches!(err, ClientError::NotAcknowledgeable(Command::Receipt)),
        "got {err:?}"
    );
}

#[tokio::test]
async fn oversized_send_fails_without_closing() {
    let (connection, mut broker) =
        connected(StompClientBuilder::new().max_frame_length(MIN_FRAME_LENGTH)).await;

    let err = connection
        .send_to("/queue/a", "x".repeat(MIN_FRAME_LENGTH))
        .await
        .expect_err("frame too large");
    assert!(matches!(err, ClientError::Codec(_)), "got {err:?}");

    connection.send_to("/q", "ok").await.expect("small frame");
    assert_eq!(broker.read_frame().await.body(), b"ok");
}

#[tokio::test]
async fn disconnect_waits_for_receipt() {
    let (connection, mut broker) = connected_default().await;
    let broker_task = tokio::spawn(async move {
        let disconnect = broker.read_frame().await;
        assert_eq!(disconnect.command(), Command::Disconnect);
        let receipt = disconnect
            .header("receipt")
            .expect("receipt requested")
            .to_owned();
        broker.write_frame(&message("s", "m", "late")).await;
        broker
            .write_frame(
                &FrameBuilder::new()
                    .command(Command::Receipt)
                    .header("receipt-id", receipt)
                    .build()
                    .expect("command is set"),
            )
            .await;
        broker
    });

    connection
        .disconnect(Some("bye-1"))
        .await
        .expect("disconnect");
    broker_task.await.expect("join broker");
}

#[tokio::test]
async fn disconnect_reports_broker_error_instead_of_receipt() {
    let (connection, mut broker) = connected_default().await;
    let broker_task = tokio::spawn(async move {
        let disconnect = broker.read_frame().await;
        assert_eq!(disconnect.command(), Command::Disconnect);
        broker
            .write_frame(
                &FrameBuilder::new()
                    .command(Command::Error)
                    .header("message", "disk full")
                    .build()
                    .expect("command is set"),
            )
            .await;
        broker
    });

    let err = connection
        .disconnect(Some("bye-2"))
        .await
        .expect_err("broker error is surfaced");
    assert!(matches!(err, ClientError::Broker(_)), "got {err:?}");
    assert_eq!(
        err.error_frame().and_then(|frame| frame.header("message")),
        Some("disk full")
    );
    assert!(err.to_string().contains("disk full"));
    broker_task.await.expect("join broker");
}

#[tokio::test]
async fn send_after_close_signal_fails() {
    let (connection, _broker) = connected_default().await;
    connection.closer().close();

    assert!(connection.is_closed());
    let err = connection
        .send_to("/queue/a", "late")
        .await
        .expect_err("closed");
    assert!(err.is_closed());
}

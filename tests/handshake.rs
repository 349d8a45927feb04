//! Integration tests for the `CONNECT` handshake over TCP.

use rstest::rstest;
use stomp_testing::{MockBroker, frames};
use stompframe::{
    ClientError,
    Command,
    Frame,
    StompClientBuilder,
    client::{ConnectOptions, HandshakeError},
};

#[tokio::test]
async fn handshake_carries_credentials_and_virtual_host() {
    let broker = MockBroker::bind().await.expect("bind broker");
    let addr = broker.addr();
    let script = broker.spawn(Vec::new());

    let connection = StompClientBuilder::new()
        .login("guest")
        .passcode("guest")
        .host("/")
        .connect(addr)
        .await
        .expect("handshake");
    let session = script.await.expect("join broker").expect("broker script");

    let connect = session.connect_frame().expect("connect frame read");
    assert_eq!(connect.header("login"), Some("guest"));
    assert_eq!(connect.header("passcode"), Some("guest"));
    assert_eq!(connect.header("host"), Some("/"));
    assert_eq!(
        connection.connected_frame().and_then(|frame| frame.header("version")),
        Some("1.2")
    );
    connection.close().await.expect("close");
}

#[tokio::test]
async fn handshake_resolves_host_names() {
    let broker = MockBroker::bind().await.expect("bind broker");
    let port = broker.addr().port();
    let script = broker.spawn(Vec::new());

    let connection = StompClientBuilder::new()
        .connect_host("localhost", port)
        .await
        .expect("handshake");
    script.await.expect("join broker").expect("broker script");
    connection.close().await.expect("close");
}

#[tokio::test]
async fn error_reply_rejects_handshake() {
    let broker = MockBroker::bind()
        .await
        .expect("bind broker")
        .handshake_reply(Some(frames::error("bad credentials")));
    let addr = broker.addr();
    let script = broker.spawn(Vec::new());

    let err = StompClientBuilder::new()
        .connect(addr)
        .await
        .expect_err("rejected");
    script.await.expect("join broker").expect("broker script");

    let ClientError::Protocol(HandshakeError::Rejected(frame)) = &err else {
        panic!("expected rejection, got {err:?}");
    };
    assert_eq!(frame.header("message"), Some("bad credentials"));
    assert!(err.to_string().contains("bad credentials"), "got {err}");
}

#[rstest]
#[case::message(frames::message("0", "m-1", "early"), Command::Message)]
#[case::receipt(frames::receipt("r-1"), Command::Receipt)]
#[tokio::test]
async fn other_replies_are_unexpected(#[case] reply: Frame, #[case] command: Command) {
    let broker = MockBroker::bind()
        .await
        .expect("bind broker")
        .handshake_reply(Some(reply));
    let addr = broker.addr();
    let script = broker.spawn(Vec::new());

    let err = StompClientBuilder::new()
        .connect(addr)
        .await
        .expect_err("unexpected reply");
    script.await.expect("join broker").expect("broker script");

    assert!(
        matches!(err, ClientError::Protocol(HandshakeError::Unexpected(c)) if c == command),
        "got {err:?}"
    );
}

#[tokio::test]
async fn silent_broker_closing_reports_no_response() {
    let broker = MockBroker::bind()
        .await
        .expect("bind broker")
        .handshake_reply(None);
    let addr = broker.addr();
    let script = broker.spawn(vec![stomp_testing::Step::Shutdown]);

    let err = StompClientBuilder::new()
        .connect(addr)
        .await
        .expect_err("no reply");
    script.await.expect("join broker").expect("broker script");

    assert!(
        matches!(err, ClientError::Protocol(HandshakeError::NoResponse)),
        "got {err:?}"
    );
}

#[tokio::test]
async fn silent_broker_hits_read_timeout() {
    let broker = MockBroker::bind()
        .await
        .expect("bind broker")
        .handshake_reply(None);
    let addr = broker.addr();
    let script = broker.spawn(vec![stomp_testing::Step::Pause(
        std::time::Duration::from_millis(500),
    )]);
    let options = ConnectOptions::from_pairs([("timeout", "50")]).expect("valid options");

    let err = StompClientBuilder::new()
        .options(options)
        .connect(addr)
        .await
        .expect_err("timed out");
    script.await.expect("join broker").expect("broker script");

    assert!(
        matches!(&err, ClientError::Io(io_err) if io_err.kind() == std::io::ErrorKind::TimedOut),
        "got {err:?}"
    );
}

#[rstest]
#[case::unknown_key(("heartbeat", "0,0"))]
#[case::negative(("timeout", "-5"))]
#[case::zero(("receive-buffer-size", "0"))]
fn invalid_option_pairs_are_configuration_errors(#[case] pair: (&str, &str)) {
    let err = ConnectOptions::from_pairs([pair]).expect_err("rejected");
    let err = ClientError::from(err);
    assert!(matches!(err, ClientError::Configuration(_)), "got {err:?}");
}

//! `CONNECT` / `CONNECTED` exchange.

use super::{ClientError, Connection, HandshakeError, runtime::ClientStream};
use crate::frame::{Command, Frame};

/// Send `connect` and wait for the broker's answer.
///
/// On success the `CONNECTED` frame is kept on the connection. On failure the
/// connection is closed before the error is returned.
pub(crate) async fn perform<T>(
    mut connection: Connection<T>,
    connect: &Frame,
) -> Result<Connection<T>, ClientError>
where
    T: ClientStream,
{
    match exchange(&connection, connect).await {
        Ok(frame) => {
            log::debug!("connected; broker answered {frame:?}");
            connection.set_connected(frame);
            Ok(connection)
        }
        Err(err) => {
            connection.close_quietly().await;
            Err(err)
        }
    }
}

async fn exchange<T>(connection: &Connection<T>, connect: &Frame) -> Result<Frame, ClientError>
where
    T: ClientStream,
{
    connection.send(connect).await?;
    let reply = match connection.receive().await {
        Ok(frame) => frame,
        Err(ClientError::Disconnected) => return Err(HandshakeError::NoResponse.into()),
        Err(err) => return Err(err),
    };
    check_reply(reply)
}

/// Classify the first frame received after `CONNECT`.
pub(crate) fn check_reply(reply: Frame) -> Result<Frame, ClientError> {
    match reply.command() {
        Command::Connected => Ok(reply),
        Command::Error => Err(HandshakeError::Rejected(Box::new(reply)).into()),
        other => Err(HandshakeError::Unexpected(other).into()),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::frame::FrameBuilder;

    #[test]
    fn connected_reply_is_accepted() {
        let reply = Frame::bare(Command::Connected);
        assert_eq!(check_reply(reply.clone()).expect("accepted"), reply);
    }

    #[test]
    fn error_reply_is_kept_for_diagnostics() {
        let reply = FrameBuilder::new()
            .command(Command::Error)
            .header("message", "bad credentials")
            .build()
            .expect("command is set");
        let err = check_reply(reply.clone()).expect_err("rejected");
        let ClientError::Protocol(handshake) = err else {
            panic!("expected protocol error, got {err:?}");
        };
        assert_eq!(handshake.error_frame(), Some(&reply));
        assert!(handshake.to_string().contains("bad credentials"));
    }

    #[rstest]
    #[case(Command::Message)]
    #[case(Command::Receipt)]
    #[case(Command::Connect)]
    fn other_replies_are_unexpected(#[case] command: Command) {
        let err = check_reply(Frame::bare(command)).expect_err("unexpected");
        assert!(
            matches!(err, ClientError::Protocol(HandshakeError::Unexpected(c)) if c == command),
            "got {err:?}"
        );
    }
}

//! `stomp-cli`: send or receive messages through a broker.
//!
//! Logging goes through `tracing`; set `RUST_LOG` to see connection spans.

mod cli;

use std::{process::ExitCode, time::Duration};

use clap::Parser;
use cli::{Cli, CliCommand};
use stompframe::{
    AckMode,
    ClientError,
    Connection,
    StompClientBuilder,
    client::{ConnectOptions, parse_pair},
};
use tracing_subscriber::EnvFilter;

const SUBSCRIPTION_ID: &str = "stomp-cli-0";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("stomp-cli: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let pairs = cli
        .options
        .iter()
        .map(|option| parse_pair(option))
        .collect::<Result<Vec<_>, _>>()?;
    let options = ConnectOptions::from_pairs(pairs)?;
    let mut builder = StompClientBuilder::new().options(options);
    if let Some(login) = cli.login {
        builder = builder.login(login);
    }
    if let Some(passcode) = cli.passcode {
        builder = builder.passcode(passcode);
    }
    let connection = builder.connect_host(&cli.host, cli.port).await?;

    match cli.command {
        CliCommand::Send {
            destination,
            message,
        } => connection.send_to(&destination, message).await?,
        CliCommand::Listen {
            destination,
            count,
            timeout_ms,
        } => listen(&connection, &destination, count, timeout_ms.map(Duration::from_millis)).await?,
    }
    connection.disconnect(None).await
}

async fn listen(
    connection: &Connection,
    destination: &str,
    count: usize,
    limit: Option<Duration>,
) -> Result<(), ClientError> {
    connection
        .subscribe(SUBSCRIPTION_ID, destination, AckMode::Auto)
        .await?;
    for _ in 0..count {
        let received = match limit {
            Some(limit) => connection.receive_timeout(limit).await,
            None => connection.receive().await,
        };
        let frame = match received {
            Ok(frame) => frame,
            Err(err) if err.is_timeout() => {
                eprintln!("stomp-cli: {err}");
                break;
            }
            Err(err) => return Err(err),
        };
        match frame.body_text() {
            Some(text) => println!("{text}"),
            None => println!("<{} bytes of binary data>", frame.body().len()),
        }
    }
    connection.unsubscribe(SUBSCRIPTION_ID).await
}

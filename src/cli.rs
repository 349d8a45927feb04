//! Command line interface for the `stomp-cli` binary.

use clap::{Parser, Subcommand};

/// Command line arguments for the `stomp-cli` binary.
#[derive(Debug, Parser)]
#[command(name = "stomp-cli", version, about = "Send and receive broker messages")]
pub struct Cli {
    /// Broker host name or address.
    #[arg(long, default_value = "localhost")]
    pub host: String,
    /// Broker port.
    #[arg(long, default_value_t = 61613)]
    pub port: u16,
    /// Login sent with `CONNECT`.
    #[arg(long)]
    pub login: Option<String>,
    /// Passcode sent with `CONNECT`.
    #[arg(long)]
    pub passcode: Option<String>,
    /// Connection option as `key=value`; may be repeated.
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Operation to perform once connected.
#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Send one text message.
    Send {
        /// Destination to send to.
        destination: String,
        /// Message body.
        message: String,
    },
    /// Subscribe and print received messages.
    Listen {
        /// Destination to subscribe to.
        destination: String,
        /// Number of messages to print before disconnecting.
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Give up waiting for a message after this many milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

//! Utilities for exercising [`stompframe`] clients against a scripted broker
//! during tests.
//!
//! [`MockBroker`] listens on a loopback port, accepts one client, answers its
//! `CONNECT` frame and then plays back a script of frames and raw bytes.
//!
//! ```rust,no_run
//! use stomp_testing::{MockBroker, Step, frames};
//! use stompframe::StompClientBuilder;
//!
//! # async fn example() -> std::io::Result<()> {
//! let broker = MockBroker::bind().await?;
//! let addr = broker.addr();
//! let script = broker.spawn(vec![Step::Frame(frames::message("0", "m-1", "hello"))]);
//! let connection = StompClientBuilder::new()
//!     .connect(addr)
//!     .await
//!     .expect("handshake");
//! let frame = connection.receive().await.expect("message");
//! assert_eq!(frame.body(), b"hello");
//! let _session = script.await.expect("join broker")?;
//! # Ok(())
//! # }
//! ```

pub mod frames;
pub mod logging;
pub mod metrics;
pub mod mock_broker;

pub use logging::{LoggerHandle, logger};
pub use metrics::{MetricsSnapshot, debugging_recorder_setup};
pub use mock_broker::{BrokerSession, MockBroker, Step};

//! # bercon
//!
//! A UDP RCON client for game servers speaking the BattlEye remote
//! console protocol: authenticate with a password, submit administrative
//! commands, and receive both synchronous command responses and
//! asynchronous broadcasts (chat, player and mission listings).
//!
//! The transport silently drops packets, fragments large responses
//! across datagrams, and drops sessions that stay quiet, so the client
//! combines four concerns:
//!
//! ## Architecture Overview
//!
//! ### Frame Codec (`protocol`)
//! Every datagram is one CRC32-checksummed frame. Inbound bytes are
//! network controlled; decoding validates length, magic and checksum
//! before touching any offset and fails closed on anything unrecognized.
//!
//! ### Fragment Reassembly (`reassembly`)
//! Multi-part responses are collected per sequence number and
//! concatenated in index order once complete. Incomplete entries expire
//! 120 seconds after creation; the protocol has no retransmission, so
//! that partial data is lost by design.
//!
//! ### Session Policy (`session`)
//! A small state machine tracks login status and idle time. Thirty quiet
//! seconds trigger a keep-alive, forty-five a login resend; queued
//! commands survive the reconnect. A login rejection ends the session
//! with no retry.
//!
//! ### Command Queue (`queue`)
//! Callers enqueue commands from any task into a mutex-guarded FIFO; the
//! network loop drains it once per iteration. Players/missions queries
//! record a correlation id that travels with the decoded result to the
//! injected [`sink::ResponseSink`].
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use bercon::client::RconClient;
//! use bercon::session::LoginCredentials;
//! use bercon::sink::ConsoleSink;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = LoginCredentials {
//!         address: "127.0.0.1".to_string(),
//!         port: 2302,
//!         password: "secret".to_string(),
//!     };
//!
//!     let mut client = RconClient::connect(credentials, Box::new(ConsoleSink)).await?;
//!     let handle = client.handle();
//!
//!     let session = tokio::spawn(async move { client.run().await });
//!
//!     handle.command("say -1 server restart in 10 mins");
//!     handle.players("players", 1);
//!     handle.disconnect();
//!
//!     session.await??;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod queue;
pub mod reassembly;
pub mod response;
pub mod session;
pub mod sink;

pub use client::{RconClient, RconHandle};
pub use error::RconError;
pub use response::PlayerRecord;
pub use session::LoginCredentials;
pub use sink::{ChannelSink, ConsoleSink, QueryResult, ResponseSink};

//! Error types for the RCON client.

/// Errors that can occur while running an RCON session.
///
/// Receive timeouts are deliberately not represented here: the protocol
/// treats a quiet socket as the trigger for keep-alive and reconnect
/// handling, not as a failure.
#[derive(Debug, thiserror::Error)]
pub enum RconError {
    /// An inbound datagram was too short, carried the wrong magic or
    /// checksum, or used an unknown frame type. Logged and skipped.
    #[error("malformed frame: {0}")]
    MalformedFrame(&'static str),

    /// A socket-level failure (e.g. connection refused). Terminates the
    /// session without an automatic restart.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The server declined the RCON password. Terminates the session;
    /// there is no automatic retry with the same credentials.
    #[error("server rejected the rcon password")]
    LoginRejected,

    /// A response line failed the structural checks of the listing
    /// parsers. Sibling lines in the same message parse independently.
    #[error("unparseable response line: {0:?}")]
    Parse(String),
}

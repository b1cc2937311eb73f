use std::time::Duration;

use mpdwire_frame::{FrameError, RecordError, ServerAck};
use mpdwire_transport::TransportError;

/// Errors surfaced to callers of the client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The server answered the command with an `ACK` line.
    #[error("server error: {0}")]
    Protocol(ServerAck),

    /// The connection dropped while the request was outstanding.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The reply could not be decoded into records.
    #[error("decode error: {0}")]
    Decode(#[from] RecordError),

    /// No reply arrived in time. The connection is re-established afterwards.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request was made while no connection was established.
    #[error("not connected")]
    NotConnected,

    /// The client was shut down.
    #[error("client closed")]
    Closed,

    /// The command could not be serialized.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The server's greeting was missing or unacceptable.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),
}

impl From<FrameError> for ClientError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::InvalidCommand(reason) => ClientError::InvalidCommand(reason),
            other => ClientError::ConnectionLost(other.to_string()),
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::ConnectionLost(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

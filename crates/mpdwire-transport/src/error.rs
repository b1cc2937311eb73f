use std::path::PathBuf;

/// Errors that can occur while opening a stream to the server.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to a TCP endpoint.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to connect to a Unix domain socket.
    #[error("failed to connect to {path}: {source}")]
    ConnectUnix {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The connect attempt did not finish in time.
    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout {
        addr: String,
        timeout: std::time::Duration,
    },

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The socket path is too long for the platform.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The endpoint description could not be used.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

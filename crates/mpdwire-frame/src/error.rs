/// Errors that can occur while framing replies or encoding commands.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An unterminated reply block grew past the configured limit.
    #[error("reply block too large ({size} bytes, max {max})")]
    BlockTooLarge { size: usize, max: usize },

    /// The server sent bytes that are not valid UTF-8.
    #[error("reply is not valid UTF-8")]
    InvalidUtf8,

    /// A command could not be serialized onto the wire.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// An I/O error occurred while reading or writing the stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed in the middle of a reply.
    #[error("connection closed (incomplete reply)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Errors raised by the key/value record decoders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// A line lacked the `<key>: <value>` shape.
    #[error("could not parse entry {line:?}")]
    MalformedLine { line: String },
}

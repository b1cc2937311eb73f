use std::fmt;
use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

/// A connected byte stream: anything the client can read replies from and
/// write commands to.
pub trait Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Stream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// Opens a fresh stream to the server.
///
/// The connection manager calls [`Connector::connect`] once per connection
/// attempt, including every reconnect, so implementations must be reusable.
/// `Display` is used in log lines and state notifications.
pub trait Connector: fmt::Display + Send + Sync + 'static {
    /// The stream type produced by this connector.
    type Stream: Stream;

    /// Open a new stream.
    fn connect(&self) -> impl Future<Output = Result<Self::Stream>> + Send;
}

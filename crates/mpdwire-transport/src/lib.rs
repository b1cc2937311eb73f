//! Stream connectors for the mpdwire client.
//!
//! The client speaks to the server over exactly one bidirectional byte stream.
//! This crate provides the ways to open that stream:
//! - TCP (`host:port`, the protocol's default of `localhost:6600`)
//! - Unix domain sockets (Linux/macOS)
//!
//! Everything above this layer only sees the [`Connector`] trait, so tests can
//! substitute in-memory streams.

pub mod error;
pub mod tcp;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use tcp::{TcpConnector, DEFAULT_HOST, DEFAULT_PORT};
pub use traits::{Connector, Stream};

#[cfg(unix)]
pub use uds::UnixConnector;

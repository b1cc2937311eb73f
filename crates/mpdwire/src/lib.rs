//! Async client for the Music Player Daemon protocol.
//!
//! mpdwire keeps one long-lived connection to the server, parks it in
//! wait-mode (`idle`) between commands so subsystem changes arrive as events,
//! and interrupts it (`noidle`) transparently whenever a command is sent.
//!
//! # Crate Structure
//!
//! - [`transport`]: Stream connectors (TCP, Unix domain sockets)
//! - [`frame`]: Reply framing, command serialization and record decoding
//! - [`client`]: Connection task, idle coordination and reconnection (behind `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use mpdwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mpdwire_frame::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use mpdwire_client::*;
}

#[cfg(feature = "client")]
pub use mpdwire_client::{Client, ClientConfig, ClientError};

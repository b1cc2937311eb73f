//! Async client for the MPD protocol.
//!
//! One long-lived connection, owned by a background task. The task keeps the
//! server in wait-mode (`idle`) while nothing else is going on, interrupts it
//! (`noidle`) whenever a command is issued, matches replies to callers in
//! strict FIFO order, and reconnects forever when the connection drops.
//!
//! ```ignore
//! use mpdwire_client::Client;
//!
//! let client = Client::connect("localhost", 6600).await?;
//! let status = client.status().await?;
//! println!("state: {:?}", status.get("state"));
//!
//! let mut player = client.subscribe_subsystem("player");
//! while let Ok(name) = player.recv().await {
//!     println!("{name} changed");
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod handshake;
pub mod policy;

mod connection;
mod correlator;
mod idle;
mod session;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::{ConnectionEvent, ConnectionEvents, ConnectionState, SubsystemEvents};
pub use handshake::{HandshakeResult, ServerVersion};
pub use policy::{ExponentialBackoff, FixedDelay, ReconnectPolicy};

pub use mpdwire_frame::{Command, CommandList, QuoteStyle, Record, ServerAck};

//! Response framing, command serialization and record decoding for the MPD
//! text protocol.
//!
//! Replies are newline-separated text. This crate turns the raw stream into
//! classified frames:
//! - `OK <protocol> <version>`: the banner sent on connect
//! - `ACK [<code>@<index>] {<command>} <message>`: a failed command
//! - `<key>: <value>` lines closed by a bare `OK`: a successful reply
//!
//! Partial input is held back until it forms a complete frame, so callers
//! never see a half-read reply.

pub mod ack;
pub mod codec;
pub mod command;
pub mod error;
pub mod record;

pub use ack::{ack_name, ServerAck};
pub use codec::{parse_response, Frame, FrameConfig, MpdCodec, ParsedResponse, DEFAULT_MAX_BLOCK};
pub use command::{
    encode_command, encode_command_list, quote_argument, Command, CommandList, QuoteStyle,
};
pub use error::{FrameError, RecordError, Result};
pub use record::{parse_pair, parse_record, parse_records, Record};

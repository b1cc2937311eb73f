//! Server error replies and the well-known ACK codes.

use std::fmt;

/// The command is not a valid command-list member.
pub const ACK_NOT_LIST: u32 = 1;
/// Bad argument.
pub const ACK_ARG: u32 = 2;
/// Bad password.
pub const ACK_PASSWORD: u32 = 3;
/// Insufficient permission for the command.
pub const ACK_PERMISSION: u32 = 4;
/// Unknown command.
pub const ACK_UNKNOWN: u32 = 5;
/// The referenced object does not exist.
pub const ACK_NO_EXIST: u32 = 50;
/// The playlist is at its maximum length.
pub const ACK_PLAYLIST_MAX: u32 = 51;
/// System error on the server.
pub const ACK_SYSTEM: u32 = 52;
/// A stored playlist failed to load.
pub const ACK_PLAYLIST_LOAD: u32 = 53;
/// A database update is already running.
pub const ACK_UPDATE_ALREADY: u32 = 54;
/// The player is not in a state that allows the command.
pub const ACK_PLAYER_SYNC: u32 = 55;
/// The object already exists.
pub const ACK_EXIST: u32 = 56;

/// Returns a human-readable name for an ACK code.
pub fn ack_name(code: u32) -> &'static str {
    match code {
        ACK_NOT_LIST => "NOT_LIST",
        ACK_ARG => "ARG",
        ACK_PASSWORD => "PASSWORD",
        ACK_PERMISSION => "PERMISSION",
        ACK_UNKNOWN => "UNKNOWN",
        ACK_NO_EXIST => "NO_EXIST",
        ACK_PLAYLIST_MAX => "PLAYLIST_MAX",
        ACK_SYSTEM => "SYSTEM",
        ACK_PLAYLIST_LOAD => "PLAYLIST_LOAD",
        ACK_UPDATE_ALREADY => "UPDATE_ALREADY",
        ACK_PLAYER_SYNC => "PLAYER_SYNC",
        ACK_EXIST => "EXIST",
        _ => "UNRECOGNIZED",
    }
}

/// A parsed `ACK [<code>@<index>] {<command>} <message>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAck {
    /// Numeric error code.
    pub code: u32,
    /// Position of the failing command inside a command list (0 otherwise).
    pub index: u32,
    /// Name of the failing command; empty when the server could not tell.
    pub command: String,
    /// Human-readable message.
    pub message: String,
}

impl ServerAck {
    /// Parse the text after the `ACK ` prefix.
    ///
    /// Returns `None` when the line does not have the ACK shape; such lines
    /// are treated as ordinary reply content by the framer.
    pub fn parse(rest: &str) -> Option<Self> {
        let rest = rest.strip_prefix('[')?;
        let (position, rest) = rest.split_once(']')?;
        let (code, index) = position.split_once('@')?;
        let code = code.parse().ok()?;
        let index = index.parse().ok()?;

        let rest = rest.strip_prefix(' ')?.strip_prefix('{')?;
        let (command, message) = rest.split_once('}')?;
        let message = message.strip_prefix(' ').unwrap_or(message);

        Some(Self {
            code,
            index,
            command: command.to_string(),
            message: message.to_string(),
        })
    }

    /// Human-readable name of [`ServerAck::code`].
    pub fn code_name(&self) -> &'static str {
        ack_name(self.code)
    }
}

impl fmt::Display for ServerAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.command.is_empty() {
            write!(f, "{} ({})", self.message, self.code_name())
        } else {
            write!(
                f,
                "{} ({}, command `{}` #{})",
                self.message,
                self.code_name(),
                self.command,
                self.index
            )
        }
    }
}

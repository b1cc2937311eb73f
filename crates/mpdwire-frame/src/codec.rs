use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::ack::ServerAck;
use crate::error::{FrameError, Result};

/// Bare terminator closing a successful reply.
pub const TERMINATOR: &str = "OK";

/// Default maximum size of a reply block that has not been terminated yet: 16 MiB.
pub const DEFAULT_MAX_BLOCK: usize = 16 * 1024 * 1024;

/// One classified unit of the reply stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Connection banner: `OK <protocol> <version>`.
    Version { protocol: String, version: String },
    /// Failed command: `ACK [...] {...} <message>`.
    Error(ServerAck),
    /// Successful reply: every line up to the bare `OK`, joined with `\n`.
    Data(String),
}

impl Frame {
    /// Short name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Version { .. } => "version",
            Frame::Error(_) => "error",
            Frame::Data(_) => "data",
        }
    }
}

/// Configuration for the reply codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum bytes buffered for one unterminated reply. Default: 16 MiB.
    pub max_block_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_block_size: DEFAULT_MAX_BLOCK,
        }
    }
}

enum LineKind {
    Version { protocol: String, version: String },
    Ack(ServerAck),
    Terminator,
    Content,
}

fn classify_line(line: &str) -> LineKind {
    if line == TERMINATOR {
        return LineKind::Terminator;
    }
    if let Some(rest) = line.strip_prefix("OK ") {
        if let Some((protocol, version)) = rest.split_once(' ') {
            if !protocol.is_empty() && !version.is_empty() {
                return LineKind::Version {
                    protocol: protocol.to_string(),
                    version: version.to_string(),
                };
            }
        }
        return LineKind::Content;
    }
    if let Some(rest) = line.strip_prefix("ACK ") {
        if let Some(ack) = ServerAck::parse(rest) {
            return LineKind::Ack(ack);
        }
    }
    LineKind::Content
}

/// Output of [`parse_response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Complete frames, in stream order.
    pub frames: Vec<Frame>,
    /// Unconsumed suffix; prepend it to the next chunk.
    pub remainder: String,
}

/// Split `input` (previous remainder followed by new text) into complete frames.
///
/// Only newline-terminated lines are classified. The trailing partial line and
/// every line of a block that has not seen its `OK` yet are returned verbatim
/// in [`ParsedResponse::remainder`], so feeding a stream in arbitrary pieces
/// yields the same frames as feeding it whole.
pub fn parse_response(input: &str) -> ParsedResponse {
    let lines: Vec<&str> = input.split('\n').collect();
    // The last piece has no newline after it yet.
    let complete = lines.len() - 1;

    let mut frames = Vec::new();
    let mut block_start = 0;

    for (i, line) in lines.iter().take(complete).enumerate() {
        match classify_line(line) {
            LineKind::Version { protocol, version } => {
                frames.push(Frame::Version { protocol, version });
                block_start = i + 1;
            }
            LineKind::Ack(ack) => {
                frames.push(Frame::Error(ack));
                block_start = i + 1;
            }
            LineKind::Terminator => {
                frames.push(Frame::Data(lines[block_start..i].join("\n")));
                block_start = i + 1;
            }
            LineKind::Content => {}
        }
    }

    ParsedResponse {
        frames,
        remainder: lines[block_start..].join("\n"),
    }
}

/// Incremental reply decoder and command-line encoder.
///
/// Decoding has the same semantics as [`parse_response`] but works on the
/// connection's `BytesMut` read buffer and remembers how far it has scanned,
/// so a long reply arriving in many reads is not rescanned from the start.
#[derive(Debug, Default)]
pub struct MpdCodec {
    config: FrameConfig,
    /// Offset of the first line of the pending block not yet classified.
    scanned: usize,
}

impl MpdCodec {
    /// Create a codec with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self { config, scanned: 0 }
    }

    /// Current codec configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn check_block_size(&self, size: usize) -> Result<()> {
        if size > self.config.max_block_size {
            return Err(FrameError::BlockTooLarge {
                size,
                max: self.config.max_block_size,
            });
        }
        Ok(())
    }
}

impl Decoder for MpdCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        loop {
            let Some(offset) = src[self.scanned..].iter().position(|b| *b == b'\n') else {
                self.check_block_size(src.len())?;
                return Ok(None);
            };

            let line_start = self.scanned;
            let line_end = line_start + offset;
            let line =
                std::str::from_utf8(&src[line_start..line_end]).map_err(|_| FrameError::InvalidUtf8)?;

            let frame = match classify_line(line) {
                LineKind::Content => {
                    self.scanned = line_end + 1;
                    self.check_block_size(self.scanned)?;
                    continue;
                }
                LineKind::Version { protocol, version } => {
                    src.advance(line_end + 1);
                    Frame::Version { protocol, version }
                }
                LineKind::Ack(ack) => {
                    src.advance(line_end + 1);
                    Frame::Error(ack)
                }
                LineKind::Terminator => {
                    let block = src.split_to(line_end + 1);
                    // Drop the separator in front of the terminator line.
                    let payload_end = line_start.saturating_sub(1);
                    let payload = std::str::from_utf8(&block[..payload_end])
                        .map_err(|_| FrameError::InvalidUtf8)?;
                    Frame::Data(payload.to_string())
                }
            };

            self.scanned = 0;
            return Ok(Some(frame));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<&str> for MpdCodec {
    type Error = FrameError;

    /// Append one logical command (possibly a multi-line command list) and
    /// its closing newline.
    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<()> {
        let item = item.trim_end();
        dst.reserve(item.len() + 1);
        dst.put_slice(item.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}

use std::sync::Arc;
use std::time::Duration;

use mpdwire_frame::{FrameConfig, QuoteStyle};

use crate::policy::{FixedDelay, ReconnectPolicy};

/// Default time allowed for the server greeting.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default time allowed for a command reply.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`crate::Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Time allowed between opening the stream and the version banner.
    pub handshake_timeout: Duration,
    /// Time allowed for each command reply. `None` waits until the reply
    /// arrives or the connection drops. An expired command forces a reconnect.
    pub command_timeout: Option<Duration>,
    /// Pause between reconnect attempts.
    pub reconnect: Arc<dyn ReconnectPolicy>,
    /// Keep the server in wait-mode between commands and report changes.
    pub idle: bool,
    /// Restrict wait-mode to these subsystems. Empty means all.
    pub idle_subsystems: Vec<String>,
    /// Argument escaping.
    pub quote_style: QuoteStyle,
    /// Reply framing limits.
    pub frame: FrameConfig,
    /// Reject servers announcing a different protocol name.
    pub expected_protocol: Option<String>,
    /// Buffered notifications per subscriber before it starts lagging.
    pub event_capacity: usize,
    /// Requests that may queue up behind the one in flight.
    pub request_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            command_timeout: Some(DEFAULT_COMMAND_TIMEOUT),
            reconnect: Arc::new(FixedDelay::default()),
            idle: true,
            idle_subsystems: Vec::new(),
            quote_style: QuoteStyle::default(),
            frame: FrameConfig::default(),
            expected_protocol: None,
            event_capacity: 256,
            request_capacity: 32,
        }
    }
}

impl ClientConfig {
    /// Replace the reconnect policy.
    pub fn with_reconnect(mut self, policy: impl ReconnectPolicy) -> Self {
        self.reconnect = Arc::new(policy);
        self
    }
}

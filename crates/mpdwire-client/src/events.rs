//! Lifecycle and change notifications.
//!
//! Each notification kind has its own broadcast channel, so a slow subscriber
//! of one kind never delays another. The current connection state is also
//! kept in a `watch` channel for callers that only care about the latest value.

use tokio::sync::{broadcast, watch};
use tracing::warn;

use crate::error::{ClientError, Result};
use crate::handshake::HandshakeResult;

/// Where the connection currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No stream; a reconnect may be pending.
    Disconnected,
    /// Opening the stream.
    Connecting,
    /// Stream open, waiting for the version banner.
    AwaitingHandshake,
    /// Ready with no command outstanding. With wait-mode enabled the
    /// server is holding an `idle` request.
    Idle,
    /// A command is outstanding.
    Busy,
}

impl ConnectionState {
    /// True once the handshake has completed.
    pub fn is_ready(self) -> bool {
        matches!(self, ConnectionState::Idle | ConnectionState::Busy)
    }
}

/// Connection lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection attempt is starting.
    Connecting,
    /// The handshake completed.
    Ready(HandshakeResult),
    /// The connection attempt or the established connection failed. A
    /// reconnect follows.
    Error { reason: String },
}

/// Stream of subsystem names reported by wait-mode, optionally filtered.
#[derive(Debug)]
pub struct SubsystemEvents {
    rx: broadcast::Receiver<String>,
    filter: Option<String>,
}

impl SubsystemEvents {
    pub(crate) fn new(rx: broadcast::Receiver<String>, filter: Option<String>) -> Self {
        Self { rx, filter }
    }

    /// Wait for the next changed subsystem.
    ///
    /// Returns [`ClientError::Closed`] once the client is gone. If this
    /// subscriber falls behind, the missed names are skipped with a warning.
    pub async fn recv(&mut self) -> Result<String> {
        loop {
            match self.rx.recv().await {
                Ok(name) => match &self.filter {
                    Some(filter) if *filter != name => continue,
                    _ => return Ok(name),
                },
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "subsystem subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(ClientError::Closed),
            }
        }
    }
}

/// Stream of [`ConnectionEvent`]s.
#[derive(Debug)]
pub struct ConnectionEvents {
    rx: broadcast::Receiver<ConnectionEvent>,
}

impl ConnectionEvents {
    pub(crate) fn new(rx: broadcast::Receiver<ConnectionEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next lifecycle event.
    pub async fn recv(&mut self) -> Result<ConnectionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Ok(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "connection event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(ClientError::Closed),
            }
        }
    }
}

/// Publishing side, owned by the connection task.
pub(crate) struct Notifier {
    state: watch::Sender<ConnectionState>,
    server: watch::Sender<Option<HandshakeResult>>,
    connection: broadcast::Sender<ConnectionEvent>,
    subsystems: broadcast::Sender<String>,
}

/// Subscribing side, held by client handles.
#[derive(Debug)]
pub(crate) struct Subscriptions {
    pub(crate) state: watch::Receiver<ConnectionState>,
    pub(crate) server: watch::Receiver<Option<HandshakeResult>>,
    pub(crate) connection: broadcast::Sender<ConnectionEvent>,
    pub(crate) subsystems: broadcast::Sender<String>,
}

pub(crate) fn channels(capacity: usize) -> (Notifier, Subscriptions) {
    let capacity = capacity.max(1);
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
    let (server_tx, server_rx) = watch::channel(None);
    let (connection_tx, _) = broadcast::channel(capacity);
    let (subsystems_tx, _) = broadcast::channel(capacity);

    let notifier = Notifier {
        state: state_tx,
        server: server_tx,
        connection: connection_tx.clone(),
        subsystems: subsystems_tx.clone(),
    };
    let subscriptions = Subscriptions {
        state: state_rx,
        server: server_rx,
        connection: connection_tx,
        subsystems: subsystems_tx,
    };
    (notifier, subscriptions)
}

impl Notifier {
    pub(crate) fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    pub(crate) fn connecting(&self) {
        self.set_state(ConnectionState::Connecting);
        let _ = self.connection.send(ConnectionEvent::Connecting);
    }

    pub(crate) fn ready(&self, handshake: HandshakeResult, state: ConnectionState) {
        self.server.send_replace(Some(handshake.clone()));
        self.set_state(state);
        let _ = self.connection.send(ConnectionEvent::Ready(handshake));
    }

    pub(crate) fn failed(&self, reason: String) {
        self.server.send_replace(None);
        self.set_state(ConnectionState::Disconnected);
        let _ = self.connection.send(ConnectionEvent::Error { reason });
    }

    pub(crate) fn stopped(&self) {
        self.server.send_replace(None);
        self.set_state(ConnectionState::Disconnected);
    }

    pub(crate) fn subsystem_changed(&self, name: String) {
        // No subscribers is not an error.
        let _ = self.subsystems.send(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filtered_subscription_skips_other_names() {
        let (notifier, subs) = channels(8);
        let mut all = SubsystemEvents::new(subs.subsystems.subscribe(), None);
        let mut mixer = SubsystemEvents::new(subs.subsystems.subscribe(), Some("mixer".into()));

        notifier.subsystem_changed("player".into());
        notifier.subsystem_changed("mixer".into());
        notifier.subsystem_changed("player".into());

        assert_eq!(all.recv().await.unwrap(), "player");
        assert_eq!(all.recv().await.unwrap(), "mixer");
        assert_eq!(all.recv().await.unwrap(), "player");
        assert_eq!(mixer.recv().await.unwrap(), "mixer");
    }

    #[tokio::test]
    async fn lagging_subscriber_resumes_with_newest() {
        let (notifier, subs) = channels(2);
        let mut events = SubsystemEvents::new(subs.subsystems.subscribe(), None);
        for name in ["a", "b", "c", "d"] {
            notifier.subsystem_changed(name.into());
        }
        assert_eq!(events.recv().await.unwrap(), "c");
        assert_eq!(events.recv().await.unwrap(), "d");
    }

    #[tokio::test]
    async fn closed_channel_reports_closed() {
        let (notifier, subs) = channels(2);
        let mut events = ConnectionEvents::new(subs.connection.subscribe());
        drop(notifier);
        drop(subs);
        assert!(matches!(events.recv().await, Err(ClientError::Closed)));
    }

    #[test]
    fn state_updates_are_visible_to_watchers() {
        let (notifier, subs) = channels(2);
        notifier.connecting();
        assert_eq!(*subs.state.borrow(), ConnectionState::Connecting);
        notifier.failed("boom".into());
        assert_eq!(*subs.state.borrow(), ConnectionState::Disconnected);
        assert!(!ConnectionState::AwaitingHandshake.is_ready());
        assert!(ConnectionState::Busy.is_ready());
    }
}

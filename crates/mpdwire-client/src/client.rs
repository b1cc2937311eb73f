use std::sync::Arc;

use mpdwire_frame::{
    encode_command, encode_command_list, parse_record, parse_records, Command, CommandList,
    QuoteStyle, Record,
};
use mpdwire_transport::{Connector, TcpConnector};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ClientConfig;
use crate::connection::{Manager, Request};
use crate::error::{ClientError, Result};
use crate::events::{
    channels, ConnectionEvent, ConnectionEvents, ConnectionState, Subscriptions, SubsystemEvents,
};
use crate::handshake::HandshakeResult;
use crate::idle::IdleCoordinator;

/// Handle to a background connection.
///
/// Cheap to clone; all clones share one connection. The connection task stops
/// when [`Client::close`] is called or the last handle is dropped.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    requests: mpsc::Sender<Request>,
    subscriptions: Subscriptions,
    shutdown: CancellationToken,
    quote_style: QuoteStyle,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl Client {
    /// Connect over TCP with default settings.
    ///
    /// Resolves once the first handshake completes, retrying for as long as it
    /// takes.
    pub async fn connect(host: impl Into<String>, port: u16) -> Result<Self> {
        Self::connect_with(TcpConnector::new(host, port), ClientConfig::default()).await
    }

    /// Connect through `connector` and wait for the first handshake, retrying
    /// according to the configured reconnect policy.
    pub async fn connect_with<C: Connector>(connector: C, config: ClientConfig) -> Result<Self> {
        let client = Self::spawn(connector, config)?;
        client.wait_ready().await?;
        Ok(client)
    }

    /// Like [`Client::connect_with`], but give up after the first failed attempt.
    pub async fn try_connect_with<C: Connector>(connector: C, config: ClientConfig) -> Result<Self> {
        let (client, mut events) = Self::start(connector, config)?;
        loop {
            match events.recv().await? {
                ConnectionEvent::Connecting => {}
                ConnectionEvent::Ready(_) => return Ok(client),
                ConnectionEvent::Error { reason } => {
                    client.close().await;
                    return Err(ClientError::ConnectionLost(reason));
                }
            }
        }
    }

    /// Start the connection task without waiting for it to connect.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<C: Connector>(connector: C, config: ClientConfig) -> Result<Self> {
        Self::start(connector, config).map(|(client, _)| client)
    }

    fn start<C: Connector>(connector: C, config: ClientConfig) -> Result<(Self, ConnectionEvents)> {
        // Surface a bad subsystem list here rather than on every connect.
        IdleCoordinator::new(&config)?;

        let (requests_tx, requests_rx) = mpsc::channel(config.request_capacity.max(1));
        let (notifier, subscriptions) = channels(config.event_capacity);
        let events = ConnectionEvents::new(subscriptions.connection.subscribe());
        let shutdown = CancellationToken::new();
        let quote_style = config.quote_style;

        debug!(addr = %connector, idle = config.idle, "starting connection task");
        let manager = Manager::new(connector, config, requests_rx, notifier, shutdown.clone());
        let task = tokio::spawn(manager.run());

        let client = Self {
            inner: Arc::new(Inner {
                requests: requests_tx,
                subscriptions,
                shutdown,
                quote_style,
                task: Mutex::new(Some(task)),
            }),
        };
        Ok((client, events))
    }

    /// Send one command and return its raw reply payload.
    pub async fn send_command(&self, command: &Command) -> Result<String> {
        let line = encode_command(command, self.inner.quote_style)?;
        self.send_line(line).await
    }

    /// Send a batch as one command list and return the combined payload.
    pub async fn send_commands(&self, commands: &CommandList) -> Result<String> {
        let block = encode_command_list(commands, self.inner.quote_style)?;
        self.send_line(block).await
    }

    /// `status`, decoded.
    pub async fn status(&self) -> Result<Record> {
        self.record(Command::new("status")).await
    }

    /// `playlistinfo`, decoded as a single record. When the queue holds
    /// several songs, later songs overwrite earlier keys; use
    /// [`Client::playlist_songs`] for the full list.
    pub async fn playlist_info(&self) -> Result<Record> {
        self.record(Command::new("playlistinfo")).await
    }

    /// `currentsong`, decoded. Empty when nothing is playing.
    pub async fn current_song(&self) -> Result<Record> {
        self.record(Command::new("currentsong")).await
    }

    /// `playlistinfo`, decoded as one record per queued song.
    pub async fn playlist_songs(&self) -> Result<Vec<Record>> {
        let payload = self.send_command(&Command::new("playlistinfo")).await?;
        Ok(parse_records(&payload)?)
    }

    /// Every subsystem change reported by wait-mode.
    pub fn subsystem_events(&self) -> SubsystemEvents {
        SubsystemEvents::new(self.inner.subscriptions.subsystems.subscribe(), None)
    }

    /// Changes of one subsystem only, e.g. `"player"`.
    pub fn subscribe_subsystem(&self, name: impl Into<String>) -> SubsystemEvents {
        SubsystemEvents::new(
            self.inner.subscriptions.subsystems.subscribe(),
            Some(name.into()),
        )
    }

    /// Connection lifecycle events from now on.
    pub fn connection_events(&self) -> ConnectionEvents {
        ConnectionEvents::new(self.inner.subscriptions.connection.subscribe())
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.subscriptions.state.borrow()
    }

    /// Wait until a connection is established and its handshake completed.
    pub async fn wait_ready(&self) -> Result<()> {
        let mut state = self.inner.subscriptions.state.clone();
        state
            .wait_for(|state| state.is_ready())
            .await
            .map(|_| ())
            .map_err(|_| ClientError::Closed)
    }

    /// Banner of the current connection, if connected.
    pub fn server_version(&self) -> Option<HandshakeResult> {
        self.inner.subscriptions.server.borrow().clone()
    }

    /// Stop the connection task, sending `close` to the server first when
    /// connected. Outstanding and later requests fail with [`ClientError::Closed`].
    pub async fn close(&self) {
        self.inner.shutdown.cancel();
        let task = self.inner.task.lock().await.take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                debug!(error = %err, "connection task ended abnormally");
            }
        }
    }

    /// True once [`Client::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    async fn record(&self, command: Command) -> Result<Record> {
        let payload = self.send_command(&command).await?;
        Ok(parse_record(&payload)?)
    }

    async fn send_line(&self, line: String) -> Result<String> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let (reply, rx) = oneshot::channel();
        self.inner
            .requests
            .send(Request { line, reply })
            .await
            .map_err(|_| ClientError::Closed)?;
        rx.await.map_err(|_| ClientError::Closed)?
    }
}

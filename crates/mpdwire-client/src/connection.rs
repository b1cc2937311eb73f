//! The connection task.
//!
//! A single task owns the stream for its whole life: it connects, waits for
//! the banner, serves requests until the stream fails, then starts over after
//! the reconnect delay. Nothing here ever returns an error to a caller
//! directly; every failure ends up as a rejected request or an event.

use std::future::Future;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use mpdwire_frame::command::CLOSE;
use mpdwire_frame::{Frame, MpdCodec};
use mpdwire_transport::{Connector, Stream};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::correlator::PendingCommand;
use crate::error::{ClientError, Result};
use crate::events::{ConnectionState, Notifier};
use crate::handshake::await_banner;
use crate::session::Session;

const CLOSE_GRACE: Duration = Duration::from_secs(1);
const FAR_FUTURE: Duration = Duration::from_secs(86_400);

/// One encoded command line (or command-list block) and where its reply goes.
#[derive(Debug)]
pub(crate) struct Request {
    pub(crate) line: String,
    pub(crate) reply: oneshot::Sender<Result<String>>,
}

enum Exit {
    Shutdown,
    Lost(String),
}

pub(crate) struct Manager<C: Connector> {
    connector: C,
    config: ClientConfig,
    requests: mpsc::Receiver<Request>,
    notifier: Notifier,
    shutdown: CancellationToken,
}

impl<C: Connector> Manager<C> {
    pub(crate) fn new(
        connector: C,
        config: ClientConfig,
        requests: mpsc::Receiver<Request>,
        notifier: Notifier,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            connector,
            config,
            requests,
            notifier,
            shutdown,
        }
    }

    /// Connect, serve and reconnect until shut down.
    pub(crate) async fn run(mut self) {
        let mut failures: u32 = 0;

        loop {
            self.notifier.connecting();
            debug!(addr = %self.connector, "connecting");

            let attempt = reject_while(&mut self.requests, &self.shutdown, self.connector.connect()).await;
            let stream = match attempt {
                None => break,
                Some(Ok(stream)) => stream,
                Some(Err(err)) => {
                    failures = failures.saturating_add(1);
                    self.fail(err.to_string());
                    if !self.backoff(failures).await {
                        break;
                    }
                    continue;
                }
            };

            self.notifier.set_state(ConnectionState::AwaitingHandshake);
            let mut framed = Framed::new(stream, MpdCodec::with_config(self.config.frame.clone()));

            let handshake = reject_while(
                &mut self.requests,
                &self.shutdown,
                await_banner(&mut framed, &self.config),
            )
            .await;
            let handshake = match handshake {
                None => {
                    hang_up(&mut framed).await;
                    break;
                }
                Some(Ok(handshake)) => handshake,
                Some(Err(err)) => {
                    failures = failures.saturating_add(1);
                    self.fail(err.to_string());
                    if !self.backoff(failures).await {
                        break;
                    }
                    continue;
                }
            };

            let session = match Session::new(&self.config) {
                Ok(session) => session,
                Err(err) => {
                    warn!(error = %err, "invalid wait-mode configuration, stopping");
                    break;
                }
            };

            failures = 0;
            info!(
                addr = %self.connector,
                protocol = %handshake.protocol,
                version = %handshake.raw_version,
                "connected"
            );
            self.notifier.ready(handshake, ConnectionState::Idle);

            match self.serve(&mut framed, session).await {
                Exit::Shutdown => {
                    hang_up(&mut framed).await;
                    break;
                }
                Exit::Lost(reason) => {
                    drop(framed);
                    self.drain_queued(&ClientError::ConnectionLost(reason.clone()));
                    failures = failures.saturating_add(1);
                    self.fail(reason);
                    if !self.backoff(failures).await {
                        break;
                    }
                }
            }
        }

        self.notifier.stopped();
        self.requests.close();
        self.drain_queued(&ClientError::Closed);
        debug!(addr = %self.connector, "connection task stopped");
    }

    async fn serve(&mut self, framed: &mut Framed<C::Stream, MpdCodec>, mut session: Session) -> Exit {
        let mut out = Vec::new();
        session.resume_idle(&mut out);

        let exit = loop {
            if let Err(reason) = flush(framed, &mut out).await {
                break Exit::Lost(reason);
            }
            self.notifier.set_state(session.state());

            let deadline = session.next_deadline();
            let wake_at = deadline.unwrap_or_else(|| Instant::now() + FAR_FUTURE);

            tokio::select! {
                _ = self.shutdown.cancelled() => break Exit::Shutdown,

                frame = framed.next() => {
                    let reply = match frame {
                        None => break Exit::Lost("connection closed by server".to_string()),
                        Some(Err(err)) => break Exit::Lost(err.to_string()),
                        Some(Ok(Frame::Version { protocol, version })) => {
                            warn!(%protocol, %version, "unexpected banner on established connection");
                            continue;
                        }
                        Some(Ok(Frame::Data(payload))) => Ok(payload),
                        Some(Ok(Frame::Error(ack))) => Err(ack),
                    };

                    for name in session.on_reply(reply) {
                        debug!(subsystem = %name, "subsystem changed");
                        self.notifier.subsystem_changed(name);
                    }

                    // Take a queued request before re-entering wait-mode, so a
                    // burst of commands does not bounce through idle/noidle.
                    if session.can_issue() {
                        match self.requests.try_recv() {
                            Ok(request) => self.issue(&mut session, request, &mut out),
                            Err(TryRecvError::Empty) => session.resume_idle(&mut out),
                            Err(TryRecvError::Disconnected) => break Exit::Shutdown,
                        }
                    }
                }

                request = self.requests.recv(), if session.can_issue() => match request {
                    Some(request) => self.issue(&mut session, request, &mut out),
                    None => break Exit::Shutdown,
                },

                _ = sleep_until(wake_at), if deadline.is_some() => {
                    if let Some(timeout) = session.expire(Instant::now()) {
                        warn!(?timeout, "command timed out, dropping connection");
                        break Exit::Lost(format!("command timed out after {timeout:?}"));
                    }
                }
            }
        };

        let err = match &exit {
            Exit::Shutdown => ClientError::Closed,
            Exit::Lost(reason) => ClientError::ConnectionLost(reason.clone()),
        };
        session.fail_all(&err);
        exit
    }

    fn issue(&self, session: &mut Session, request: Request, out: &mut Vec<String>) {
        debug!(command = request.line.split('\n').next().unwrap_or_default(), "issuing");
        let pending = PendingCommand::new(request.reply, self.config.command_timeout);
        session.issue(request.line, pending, out);
    }

    fn fail(&self, reason: String) {
        warn!(addr = %self.connector, %reason, "connection failed");
        self.notifier.failed(reason);
    }

    /// Wait out the reconnect delay. Returns false when shut down meanwhile.
    async fn backoff(&mut self, failures: u32) -> bool {
        let delay = self.config.reconnect.delay(failures);
        debug!(?delay, failures, "reconnecting after delay");
        reject_while(&mut self.requests, &self.shutdown, sleep(delay))
            .await
            .is_some()
    }

    fn drain_queued(&mut self, err: &ClientError) {
        while let Ok(request) = self.requests.try_recv() {
            let _ = request.reply.send(Err(err.clone()));
        }
    }
}

/// Drive `fut` to completion while rejecting incoming requests with
/// [`ClientError::NotConnected`]. Returns `None` on shutdown.
async fn reject_while<F: Future>(
    requests: &mut mpsc::Receiver<Request>,
    shutdown: &CancellationToken,
    fut: F,
) -> Option<F::Output> {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return None,
            output = &mut fut => return Some(output),
            request = requests.recv() => match request {
                Some(request) => {
                    let _ = request.reply.send(Err(ClientError::NotConnected));
                }
                None => return None,
            },
        }
    }
}

async fn flush<S: Stream>(
    framed: &mut Framed<S, MpdCodec>,
    out: &mut Vec<String>,
) -> std::result::Result<(), String> {
    if out.is_empty() {
        return Ok(());
    }
    for line in out.drain(..) {
        framed
            .feed(line.as_str())
            .await
            .map_err(|err| format!("write failed: {err}"))?;
    }
    SinkExt::<&str>::flush(framed)
        .await
        .map_err(|err| format!("write failed: {err}"))
}

async fn hang_up<S: Stream>(framed: &mut Framed<S, MpdCodec>) {
    match tokio::time::timeout(CLOSE_GRACE, framed.send(CLOSE)).await {
        Ok(Ok(())) => debug!("sent close"),
        Ok(Err(err)) => debug!(error = %err, "close not delivered"),
        Err(_) => debug!("close not delivered in time"),
    }
}

//! FIFO matching of replies to outstanding requests.
//!
//! The server answers strictly in order, so the oldest pending entry always
//! owns the next reply. A wait-mode request sits in the same queue as ordinary
//! commands; its reply is the list of changed subsystems.

use std::collections::VecDeque;
use std::time::Duration;

use mpdwire_frame::ServerAck;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// A command waiting for its reply.
#[derive(Debug)]
pub(crate) struct PendingCommand {
    reply: oneshot::Sender<Result<String>>,
    created_at: Instant,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
}

impl PendingCommand {
    pub(crate) fn new(reply: oneshot::Sender<Result<String>>, timeout: Option<Duration>) -> Self {
        let created_at = Instant::now();
        Self {
            reply,
            created_at,
            deadline: timeout.map(|timeout| created_at + timeout),
            timeout,
        }
    }

    fn settle(self, outcome: Result<String>) {
        // The caller may have given up; that is not an error here.
        let _ = self.reply.send(outcome);
    }
}

#[derive(Debug)]
pub(crate) enum Pending {
    Idle,
    Command(PendingCommand),
}

/// What a reply turned out to belong to.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// A command was settled.
    Command,
    /// A wait-mode request completed with this payload.
    Idle(String),
    /// The server refused a wait-mode request.
    IdleRejected(ServerAck),
    /// Nothing was pending. The reply is dropped.
    Unsolicited,
}

#[derive(Debug, Default)]
pub(crate) struct Correlator {
    queue: VecDeque<Pending>,
}

impl Correlator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enqueue(&mut self, pending: Pending) {
        self.queue.push_back(pending);
    }

    /// Hand the next reply to the oldest pending entry.
    pub(crate) fn resolve_next(&mut self, reply: std::result::Result<String, ServerAck>) -> Resolution {
        match self.queue.pop_front() {
            Some(Pending::Command(command)) => {
                debug!(elapsed = ?command.created_at.elapsed(), ok = reply.is_ok(), "command settled");
                command.settle(reply.map_err(ClientError::Protocol));
                Resolution::Command
            }
            Some(Pending::Idle) => match reply {
                Ok(payload) => Resolution::Idle(payload),
                Err(ack) => Resolution::IdleRejected(ack),
            },
            None => {
                warn!("reply received with nothing pending, dropping it");
                Resolution::Unsolicited
            }
        }
    }

    /// Reject every pending command with `err` and empty the queue.
    pub(crate) fn fail_all(&mut self, err: &ClientError) {
        for pending in self.queue.drain(..) {
            if let Pending::Command(command) = pending {
                command.settle(Err(err.clone()));
            }
        }
    }

    pub(crate) fn has_command(&self) -> bool {
        self.queue
            .iter()
            .any(|pending| matches!(pending, Pending::Command(_)))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Earliest deadline among pending commands.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.queue
            .iter()
            .filter_map(|pending| match pending {
                Pending::Command(command) => command.deadline,
                Pending::Idle => None,
            })
            .min()
    }

    /// Reject the command whose deadline has passed, if any, and report its timeout.
    ///
    /// Later replies cannot be matched once one is skipped, so the caller must
    /// drop the connection after a `Some`.
    pub(crate) fn expire(&mut self, now: Instant) -> Option<Duration> {
        let index = self.queue.iter().position(|pending| match pending {
            Pending::Command(command) => command.deadline.is_some_and(|deadline| deadline <= now),
            Pending::Idle => false,
        })?;

        match self.queue.remove(index) {
            Some(Pending::Command(command)) => {
                let timeout = command.timeout.unwrap_or_default();
                command.settle(Err(ClientError::Timeout(timeout)));
                Some(timeout)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(timeout: Option<Duration>) -> (Pending, oneshot::Receiver<Result<String>>) {
        let (tx, rx) = oneshot::channel();
        (Pending::Command(PendingCommand::new(tx, timeout)), rx)
    }

    #[tokio::test]
    async fn replies_settle_in_fifo_order() {
        let mut correlator = Correlator::new();
        let (first, first_rx) = command(None);
        let (second, second_rx) = command(None);
        correlator.enqueue(first);
        correlator.enqueue(second);

        assert_eq!(correlator.resolve_next(Ok("a: 1".into())), Resolution::Command);
        assert_eq!(correlator.resolve_next(Ok("a: 2".into())), Resolution::Command);

        assert_eq!(first_rx.await.unwrap().unwrap(), "a: 1");
        assert_eq!(second_rx.await.unwrap().unwrap(), "a: 2");
        assert!(correlator.is_empty());
    }

    #[tokio::test]
    async fn ack_rejects_only_its_command() {
        let mut correlator = Correlator::new();
        let (first, first_rx) = command(None);
        let (second, second_rx) = command(None);
        correlator.enqueue(first);
        correlator.enqueue(second);

        let ack = ServerAck::parse("[50@0] {play} No such song").unwrap();
        correlator.resolve_next(Err(ack.clone()));
        correlator.resolve_next(Ok(String::new()));

        assert!(matches!(first_rx.await.unwrap(), Err(ClientError::Protocol(a)) if a == ack));
        assert_eq!(second_rx.await.unwrap().unwrap(), "");
    }

    #[test]
    fn idle_entry_yields_payload() {
        let mut correlator = Correlator::new();
        correlator.enqueue(Pending::Idle);
        assert!(!correlator.has_command());
        assert_eq!(
            correlator.resolve_next(Ok("changed: player".into())),
            Resolution::Idle("changed: player".into())
        );
        assert_eq!(correlator.resolve_next(Ok(String::new())), Resolution::Unsolicited);
    }

    #[tokio::test]
    async fn fail_all_rejects_every_command() {
        let mut correlator = Correlator::new();
        let (first, first_rx) = command(None);
        let (second, second_rx) = command(None);
        correlator.enqueue(Pending::Idle);
        correlator.enqueue(first);
        correlator.enqueue(second);

        correlator.fail_all(&ClientError::ConnectionLost("reset".into()));
        assert!(correlator.is_empty());
        assert!(matches!(first_rx.await.unwrap(), Err(ClientError::ConnectionLost(_))));
        assert!(matches!(second_rx.await.unwrap(), Err(ClientError::ConnectionLost(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_command_is_rejected_with_timeout() {
        let mut correlator = Correlator::new();
        let (slow, slow_rx) = command(Some(Duration::from_millis(100)));
        correlator.enqueue(slow);

        assert!(correlator.expire(Instant::now()).is_none());
        let deadline = correlator.next_deadline().unwrap();
        tokio::time::sleep_until(deadline).await;

        assert_eq!(correlator.expire(Instant::now()), Some(Duration::from_millis(100)));
        assert!(matches!(slow_rx.await.unwrap(), Err(ClientError::Timeout(_))));
        assert!(correlator.next_deadline().is_none());
    }
}

//! Per-connection protocol state: the correlator plus the wait-mode machine.
//!
//! A `Session` is created fresh for every established connection and dropped
//! with it. It never touches the socket; methods push the lines to write onto
//! an output buffer which the connection task flushes.

use mpdwire_frame::command::NOIDLE;
use mpdwire_frame::ServerAck;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::correlator::{Correlator, Pending, PendingCommand, Resolution};
use crate::error::{ClientError, Result};
use crate::events::ConnectionState;
use crate::idle::{parse_changed, IdleCoordinator, WaitState};

#[derive(Debug)]
pub(crate) struct Session {
    correlator: Correlator,
    idle: IdleCoordinator,
}

impl Session {
    pub(crate) fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            correlator: Correlator::new(),
            idle: IdleCoordinator::new(config)?,
        })
    }

    /// Queue a command line, interrupting wait-mode first if it is active.
    pub(crate) fn issue(&mut self, line: String, pending: PendingCommand, out: &mut Vec<String>) {
        if self.idle.state() == WaitState::Idle {
            // The outstanding idle entry takes the reply to noidle.
            out.push(NOIDLE.to_string());
            self.idle.leave();
        }
        self.correlator.enqueue(Pending::Command(pending));
        out.push(line);
    }

    /// Re-enter wait-mode when nothing is outstanding.
    pub(crate) fn resume_idle(&mut self, out: &mut Vec<String>) {
        if !self.idle.enabled() || self.idle.state() == WaitState::Idle || !self.correlator.is_empty() {
            return;
        }
        out.push(self.idle.enter().to_string());
        self.correlator.enqueue(Pending::Idle);
    }

    /// Route a reply frame. Returns the subsystems a wait-mode reply reported.
    pub(crate) fn on_reply(&mut self, reply: std::result::Result<String, ServerAck>) -> Vec<String> {
        match self.correlator.resolve_next(reply) {
            Resolution::Idle(payload) => {
                self.idle.leave();
                let changed = parse_changed(&payload);
                debug!(count = changed.len(), "wait-mode ended");
                changed
            }
            Resolution::IdleRejected(ack) => {
                self.idle.leave();
                self.idle.disable();
                warn!(error = %ack, "server refused idle, wait-mode disabled for this connection");
                Vec::new()
            }
            Resolution::Command | Resolution::Unsolicited => Vec::new(),
        }
    }

    /// True when no command is awaiting a reply.
    pub(crate) fn can_issue(&self) -> bool {
        !self.correlator.has_command()
    }

    pub(crate) fn state(&self) -> ConnectionState {
        if self.correlator.has_command() {
            ConnectionState::Busy
        } else {
            ConnectionState::Idle
        }
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.correlator.next_deadline()
    }

    pub(crate) fn expire(&mut self, now: Instant) -> Option<std::time::Duration> {
        self.correlator.expire(now)
    }

    pub(crate) fn fail_all(&mut self, err: &ClientError) {
        self.correlator.fail_all(err);
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;

    fn pending() -> (PendingCommand, oneshot::Receiver<Result<String>>) {
        let (tx, rx) = oneshot::channel();
        (PendingCommand::new(tx, None), rx)
    }

    #[test]
    fn enters_wait_mode_when_nothing_is_outstanding() {
        let mut session = Session::new(&ClientConfig::default()).unwrap();
        let mut out = Vec::new();
        session.resume_idle(&mut out);
        session.resume_idle(&mut out);
        assert_eq!(out, vec!["idle"]);
        assert_eq!(session.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn command_during_wait_mode_sends_exactly_one_noidle() {
        let mut session = Session::new(&ClientConfig::default()).unwrap();
        let mut out = Vec::new();
        session.resume_idle(&mut out);

        let (status, status_rx) = pending();
        session.issue("status".to_string(), status, &mut out);
        assert_eq!(session.state(), ConnectionState::Busy);
        assert!(!session.can_issue());

        // Early reply to the interrupted idle, then the status reply.
        assert!(session.on_reply(Ok(String::new())).is_empty());
        assert!(session.on_reply(Ok("state: play".to_string())).is_empty());
        session.resume_idle(&mut out);

        assert_eq!(out, vec!["idle", "noidle", "status", "idle"]);
        assert_eq!(status_rx.await.unwrap().unwrap(), "state: play");
    }

    #[tokio::test]
    async fn changes_in_interrupted_idle_reply_stay_out_of_command_reply() {
        let mut session = Session::new(&ClientConfig::default()).unwrap();
        let mut out = Vec::new();
        session.resume_idle(&mut out);

        let (status, status_rx) = pending();
        session.issue("status".to_string(), status, &mut out);

        let changed = session.on_reply(Ok("changed: player\nchanged: player".to_string()));
        assert_eq!(changed, vec!["player", "player"]);
        assert_eq!(session.state(), ConnectionState::Busy);

        assert!(session.on_reply(Ok("state: play".to_string())).is_empty());
        assert_eq!(status_rx.await.unwrap().unwrap(), "state: play");
    }

    #[test]
    fn wait_mode_reply_reports_changes_in_order() {
        let mut session = Session::new(&ClientConfig::default()).unwrap();
        let mut out = Vec::new();
        session.resume_idle(&mut out);

        let changed = session.on_reply(Ok("changed: player\nchanged: mixer".to_string()));
        assert_eq!(changed, vec!["player", "mixer"]);

        session.resume_idle(&mut out);
        assert_eq!(out, vec!["idle", "idle"]);
    }

    #[tokio::test]
    async fn burst_of_commands_resolves_in_order() {
        let config = ClientConfig {
            idle: false,
            ..ClientConfig::default()
        };
        let mut session = Session::new(&config).unwrap();
        let mut out = Vec::new();
        let mut receivers = Vec::new();
        for i in 0..3 {
            let (tx, rx) = pending();
            session.issue(format!("cmd{i}"), tx, &mut out);
            receivers.push(rx);
        }
        for i in 0..3 {
            session.on_reply(Ok(format!("n: {i}")));
        }
        session.resume_idle(&mut out);

        assert_eq!(out, vec!["cmd0", "cmd1", "cmd2"]);
        for (i, rx) in receivers.into_iter().enumerate() {
            assert_eq!(rx.await.unwrap().unwrap(), format!("n: {i}"));
        }
    }

    #[test]
    fn refused_idle_disables_wait_mode() {
        let mut session = Session::new(&ClientConfig::default()).unwrap();
        let mut out = Vec::new();
        session.resume_idle(&mut out);
        let ack = ServerAck::parse("[5@0] {idle} unknown command \"idle\"").unwrap();
        session.on_reply(Err(ack));
        session.resume_idle(&mut out);
        assert_eq!(out, vec!["idle"]);
    }

    #[tokio::test]
    async fn fail_all_rejects_outstanding_command() {
        let mut session = Session::new(&ClientConfig::default()).unwrap();
        let mut out = Vec::new();
        let (tx, rx) = pending();
        session.issue("status".to_string(), tx, &mut out);
        session.fail_all(&ClientError::ConnectionLost("reset".into()));
        assert!(matches!(rx.await.unwrap(), Err(ClientError::ConnectionLost(_))));
        assert!(session.can_issue());
    }
}

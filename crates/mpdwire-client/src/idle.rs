//! Wait-mode bookkeeping.

use mpdwire_frame::command::IDLE;
use mpdwire_frame::{encode_command, Command, QuoteStyle};

use crate::config::ClientConfig;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitState {
    /// An `idle` request is outstanding.
    Idle,
    /// No `idle` request is outstanding.
    Busy,
}

#[derive(Debug)]
pub(crate) struct IdleCoordinator {
    enabled: bool,
    idle_line: String,
    state: WaitState,
}

impl IdleCoordinator {
    pub(crate) fn new(config: &ClientConfig) -> Result<Self> {
        let command = Command::new(IDLE).args(config.idle_subsystems.iter().cloned());
        Ok(Self {
            enabled: config.idle,
            idle_line: encode_command(&command, QuoteStyle::QuotesOnly)?,
            state: WaitState::Busy,
        })
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn disable(&mut self) {
        self.enabled = false;
    }

    pub(crate) fn state(&self) -> WaitState {
        self.state
    }

    pub(crate) fn enter(&mut self) -> &str {
        self.state = WaitState::Idle;
        &self.idle_line
    }

    pub(crate) fn leave(&mut self) {
        self.state = WaitState::Busy;
    }
}

/// Subsystem names from a wait-mode reply, in order, duplicates kept.
pub(crate) fn parse_changed(payload: &str) -> Vec<String> {
    payload
        .split('\n')
        .filter_map(|line| line.strip_prefix("changed: "))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_changed_lines_in_order() {
        assert_eq!(
            parse_changed("changed: player\nchanged: mixer\nchanged: player"),
            vec!["player", "mixer", "player"]
        );
        assert!(parse_changed("").is_empty());
        assert_eq!(parse_changed("foo: bar\nchanged: options"), vec!["options"]);
    }

    #[test]
    fn idle_line_lists_subsystems() {
        let config = ClientConfig {
            idle_subsystems: vec!["player".into(), "mixer".into()],
            ..ClientConfig::default()
        };
        let mut idle = IdleCoordinator::new(&config).unwrap();
        assert_eq!(idle.state(), WaitState::Busy);
        assert_eq!(idle.enter(), r#"idle "player" "mixer""#);
        assert_eq!(idle.state(), WaitState::Idle);

        let mut plain = IdleCoordinator::new(&ClientConfig::default()).unwrap();
        assert_eq!(plain.enter(), "idle");
    }

    #[test]
    fn invalid_subsystem_name_is_rejected() {
        let config = ClientConfig {
            idle_subsystems: vec!["bad\nname".into()],
            ..ClientConfig::default()
        };
        assert!(IdleCoordinator::new(&config).is_err());
    }
}

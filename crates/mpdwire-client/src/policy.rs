//! Reconnect delay policies.
//!
//! The connection manager never gives up; a policy only decides how long to
//! wait before the next attempt.

use std::fmt;
use std::time::Duration;

/// Delay used by [`FixedDelay::default`].
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Decides the pause before a reconnect attempt.
pub trait ReconnectPolicy: fmt::Debug + Send + Sync + 'static {
    /// Delay before the next attempt, given the number of consecutive
    /// failures so far (starting at 1).
    fn delay(&self, failures: u32) -> Duration;
}

/// The same delay every time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl Default for FixedDelay {
    fn default() -> Self {
        Self(DEFAULT_RECONNECT_DELAY)
    }
}

impl ReconnectPolicy for FixedDelay {
    fn delay(&self, _failures: u32) -> Duration {
        self.0
    }
}

/// Doubling delay, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy for ExponentialBackoff {
    fn delay(&self, failures: u32) -> Duration {
        let shift = failures.saturating_sub(1).min(16);
        self.initial.saturating_mul(1 << shift).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_delay_never_grows() {
        let policy = FixedDelay(Duration::from_millis(250));
        assert_eq!(policy.delay(1), Duration::from_millis(250));
        assert_eq!(policy.delay(1_000), Duration::from_millis(250));
    }

    #[test]
    fn exponential_backoff_doubles_until_cap() {
        let policy = ExponentialBackoff {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(1),
        };
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(4), Duration::from_millis(800));
        assert_eq!(policy.delay(5), Duration::from_secs(1));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(1));
    }
}

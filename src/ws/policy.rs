//! Reconnect strategies

use std::fmt;
use std::time::Duration;

/// Decides how long to wait before each reconnect attempt
pub trait ReconnectPolicy: Send + Sync + fmt::Debug {
    /// Delay before reconnect attempt `attempt` (1-based since the last
    /// established connection), or `None` to stop reconnecting
    fn next_delay(&self, attempt: u32) -> Option<Duration>;
}

/// Reconnect right away, forever
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl ReconnectPolicy for Immediate {
    fn next_delay(&self, _attempt: u32) -> Option<Duration> {
        Some(Duration::ZERO)
    }
}

/// Doubling delay capped at `max_delay`
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Attempts before giving up (0 = never give up)
    pub max_attempts: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 0,
        }
    }
}

impl ReconnectPolicy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if self.max_attempts > 0 && attempt > self.max_attempts {
            return None;
        }
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self.initial_delay.saturating_mul(1u32 << exponent);
        Some(delay.min(self.max_delay))
    }
}

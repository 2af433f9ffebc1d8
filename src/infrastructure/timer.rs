use std::time::Duration;

/// Retry budget for the reconnect policy: a fixed delay between attempts
/// and a hard cap on how many fire automatically.
///
/// This is deliberately not exponential backoff; the channel's policy is a
/// constant interval with a bounded attempt count.
#[derive(Debug)]
pub struct ReconnectTimer {
    attempts: u32,
    max_attempts: u32,
    interval: Duration,
}

impl ReconnectTimer {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            interval,
        }
    }

    /// Consumes one attempt from the budget. Returns the delay to wait
    /// before the next attempt, or `None` once the cap is reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.interval)
    }

    /// Re-arms the budget. Called on every successful connection and on
    /// explicit `connect()`/`set_endpoint()`.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

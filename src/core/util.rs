//! Small helpers shared across components that reconnect over WebSocket.

use std::time::Duration;

/// Exponential backoff with a cap, resetting to base on success. Shared by
/// the crypto feed's exchange sessions and the execution client's
/// order-book subscriptions — both reconnect the same way.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
    current: Duration,
}

impl Backoff {
    #[must_use]
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            current: base,
        }
    }

    /// Current wait, then double it (capped) for next time.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = std::cmp::min(self.current * 2, self.cap);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

//! Cycle timing for the per-host loops
//!
//! Both loops share the same shape: act, then wait either a full interval
//! (after success) or a short backoff (after a transient failure). Waiting goes
//! through `tokio::time`, so a paused test runtime advances it virtually.

use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub interval: Duration,
    pub retry_backoff: Duration,
}

impl Schedule {
    pub fn new(interval: Duration, retry_backoff: Duration) -> Self {
        Self {
            interval,
            retry_backoff,
        }
    }

    /// Wait out a full cycle after a successful pass
    pub async fn next_cycle(&self) {
        sleep(self.interval).await;
    }

    /// Wait out the backoff after a failed pass
    pub async fn retry(&self) {
        sleep(self.retry_backoff).await;
    }
}

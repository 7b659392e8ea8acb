//! Request pacing
//!
//! One [`Throttle`] is shared by every section of a run. It carries no state
//! besides the instant the previous turn was granted; there is no burst
//! allowance and no adaptive backoff.

use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Enforces a minimum spacing between outgoing requests
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_turn: Option<Instant>,
}

impl Throttle {
    /// Creates a throttle whose first turn is granted immediately
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_turn: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until at least `min_interval` has passed since the previous turn
    ///
    /// Must be awaited right before every request, retries included.
    pub async fn wait_turn(&mut self) {
        if let Some(last_turn) = self.last_turn {
            let next_turn = last_turn + self.min_interval;
            if next_turn > Instant::now() {
                tracing::debug!(
                    "Throttling for {:?}",
                    next_turn.saturating_duration_since(Instant::now())
                );
                sleep_until(next_turn).await;
            }
        }
        self.last_turn = Some(Instant::now());
    }
}

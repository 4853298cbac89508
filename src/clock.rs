//! src/clock.rs
//!
//! Wall-clock milliseconds derived from tokio's monotonic clock.

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

/// Epoch-millisecond clock anchored to a tokio `Instant`.
///
/// Anchoring on tokio time (instead of reading `SystemTime` on every call) keeps
/// the clock monotonic and lets paused tokio time drive it in tests.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    origin: Instant,
    origin_ms: i64,
}

impl Clock {
    /// Clock anchored to the current system time.
    pub fn system() -> Self {
        let origin_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or_default();
        Self::starting_at(origin_ms)
    }

    /// Clock that reads `origin_ms` right now.
    pub fn starting_at(origin_ms: i64) -> Self {
        Self {
            origin: Instant::now(),
            origin_ms,
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.origin_ms + self.origin.elapsed().as_millis() as i64
    }

    pub fn now_secs(&self) -> f64 {
        self.now_ms() as f64 / 1000.0
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn follows_paused_tokio_time() {
        let clock = Clock::starting_at(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        tokio::time::advance(Duration::from_millis(2_500)).await;
        assert_eq!(clock.now_ms(), 3_500);
    }
}

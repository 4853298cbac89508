//! src/chart/scheduler.rs
//!
//! Autofetch: decide whether to fetch now or arm a timer for the next
//! interval boundary, and the failure backoff that stretches that interval.

use std::time::Duration;

use tracing::debug;

use super::{Chart, chart_of};
use crate::timer::{self, Timer};

impl Chart {
    /// Effective polling interval in ms: the chart's `updateEvery`, else the
    /// served view's interval once loaded, else the metadata's, else the
    /// configured default.
    pub fn update_every_ms(&self) -> u64 {
        if let Some(secs) = self.get_f64("updateEvery").filter(|secs| *secs > 0.0) {
            return (secs * 1000.0) as u64;
        }
        if self.get_bool("loaded") {
            if let Some(every) = self.payload().view_update_every.filter(|every| *every > 0) {
                return every * 1000;
            }
        }
        let secs = self
            .metadata()
            .update_every
            .filter(|every| *every > 0)
            .unwrap_or(self.core().config.default_update_every_secs);
        secs * 1000
    }

    pub fn backoff_ms(&self) -> Option<u64> {
        self.core().state.borrow().backoff_ms
    }

    /// Double the backoff, seeding it with the update interval, up to the cap.
    pub(super) fn backoff(&self) {
        let seed = self.update_every_ms();
        let max = self.core().config.max_backoff_ms;
        let mut state = self.core().state.borrow_mut();
        let next = state.backoff_ms.map_or(seed, |ms| ms.saturating_mul(2));
        state.backoff_ms = Some(next.min(max));
    }

    /// Fetch now if an interval has elapsed since the last fetch started,
    /// otherwise arm a timer that re-runs this check at the next boundary.
    ///
    /// No-op unless the chart autofetches, is active and is not loading.
    ///
    /// The interval is `max(updateEveryMs, backoffMs)`; the wait is its
    /// remainder after the time already spent since `fetchStartedAt`, so a
    /// pending backoff stretches the interval without losing drift correction.
    pub fn start_autofetch(&self) {
        if self.is_destroyed()
            || !self.get_bool("autofetch")
            || !self.get_bool("active")
            || self.get_bool("loading")
            || self.is_fetch_pending()
        {
            return;
        }

        let started_at = self.get_i64("fetchStartedAt").unwrap_or(0);
        if started_at == 0 {
            let _ = self.fetch();
            return;
        }

        let period = (self.core().clock.now_ms() - started_at).max(0) as u64;
        let interval = self
            .update_every_ms()
            .max(self.backoff_ms().unwrap_or(0))
            .max(1);

        if period / interval >= 1 {
            debug!(chart = %self.id(), period, interval, "interval elapsed, fetching");
            let _ = self.fetch();
            return;
        }

        let remaining = interval - period % interval;
        debug!(chart = %self.id(), remaining, "scheduling next fetch");
        let weak = self.downgrade();
        let next = Timer::after(Duration::from_millis(remaining), move || {
            if let Some(chart) = chart_of(&weak) {
                chart.core().state.borrow_mut().autofetch_timer = None;
                chart.start_autofetch();
            }
        });

        let mut state = self.core().state.borrow_mut();
        timer::clear(&mut state.autofetch_timer);
        state.autofetch_timer = Some(next);
    }

    /// Clear the scheduler timer. A fetch still running or queued after the
    /// chart was deactivated is cancelled as well.
    pub fn stop_autofetch(&self) {
        timer::clear(&mut self.core().state.borrow_mut().autofetch_timer);

        let busy = self.get_bool("loading") || self.is_fetch_pending();
        if !self.get_bool("active") && self.get_bool("loaded") && busy {
            debug!(chart = %self.id(), "cancelling fetch of inactive chart");
            self.cancel_fetch();
        }
    }
}

//! src/chart/fetch.rs
//!
//! One fetch cycle: synchronous prologue, metadata refresh, data request,
//! settle (success or failure), and the finish step that re-arms the scheduler.

use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::FutureExt;
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{Chart, Lane, chart_of};
use crate::error::FetchError;
use crate::node::Event;
use crate::payload::Payload;
use crate::timer::{self, Timer};

/// Resolves once the requested fetch, or the one it was coalesced into, has
/// settled. The fetch itself runs on a local task whether or not this is awaited.
pub struct FetchHandle {
    lane: Option<Lane>,
}

impl FetchHandle {
    fn settled() -> Self {
        Self { lane: None }
    }
}

impl Future for FetchHandle {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match self.lane.as_mut() {
            Some(lane) => lane.poll_unpin(cx),
            None => Poll::Ready(()),
        }
    }
}

impl Chart {
    /// Fetch metadata and data now.
    ///
    /// With nothing in flight the prologue (`StartFetch`, `loading`,
    /// `fetchStartedAt`, timeout timer) runs before this returns; a call made
    /// from inside that prologue joins the fetch being started. With a request
    /// in flight, that one is cancelled and a single follow-up is queued behind
    /// it; further calls join the queued one. Must be called inside a `LocalSet`.
    pub fn fetch(&self) -> FetchHandle {
        if self.is_destroyed() {
            return FetchHandle::settled();
        }

        let pending = self.core().state.borrow().pending;
        match pending {
            0 => {
                let started = Rc::new(Cell::new(None));
                let lane = {
                    let (chart, started) = (self.clone(), started.clone());
                    async move {
                        if let Some(token) = started.take() {
                            chart.run(token).await;
                        }
                    }
                    .boxed_local()
                    .shared()
                };
                {
                    let mut state = self.core().state.borrow_mut();
                    state.pending = 1;
                    state.lane = Some(lane.clone());
                }
                let Some(token) = self.begin_fetch() else {
                    self.settle_pending();
                    return FetchHandle::settled();
                };
                started.set(Some(token));
                self.launch(lane)
            }
            1 => {
                let (previous, generation) = {
                    let mut state = self.core().state.borrow_mut();
                    // No token yet: the prologue is still running.
                    let Some(token) = state.cancel.clone() else {
                        return FetchHandle {
                            lane: state.lane.clone(),
                        };
                    };
                    token.cancel();
                    state.pending = 2;
                    (state.lane.clone(), state.generation)
                };
                debug!(chart = %self.id(), "superseding in-flight fetch");

                let weak = self.downgrade();
                let lane = async move {
                    if let Some(previous) = previous {
                        previous.await;
                    }
                    let Some(chart) = chart_of(&weak) else { return };
                    if chart.core().state.borrow().generation != generation {
                        debug!(chart = %chart.id(), "dropping queued fetch after cancellation");
                        chart.settle_pending();
                        chart.start_autofetch();
                        return;
                    }
                    chart.core().state.borrow_mut().cancel = None;
                    match chart.begin_fetch() {
                        Some(token) => chart.run(token).await,
                        None => chart.settle_pending(),
                    }
                };
                self.launch(lane.boxed_local().shared())
            }
            _ => FetchHandle {
                lane: self.core().state.borrow().lane.clone(),
            },
        }
    }

    /// Abort the in-flight request, if any, and drop a queued follow-up.
    /// `loading` is cleared by the aborted request's failure path; no
    /// `FailFetch` is fired.
    pub fn cancel_fetch(&self) {
        let mut state = self.core().state.borrow_mut();
        state.generation += 1;
        if let Some(token) = &state.cancel {
            token.cancel();
        }
    }

    pub fn is_fetch_pending(&self) -> bool {
        self.core().state.borrow().pending > 0
    }

    fn launch(&self, lane: Lane) -> FetchHandle {
        self.core().state.borrow_mut().lane = Some(lane.clone());
        tokio::task::spawn_local(lane.clone());
        FetchHandle { lane: Some(lane) }
    }

    fn settle_pending(&self) {
        let mut state = self.core().state.borrow_mut();
        state.pending = state.pending.saturating_sub(1);
        if state.pending == 0 {
            state.lane = None;
            state.cancel = None;
        }
    }

    /// Synchronous prologue. `None` when there is nothing to fetch.
    ///
    /// A cancellation requested by a listener while the prologue runs hands
    /// back an already cancelled token, so the request settles as aborted.
    fn begin_fetch(&self) -> Option<CancellationToken> {
        if self.is_destroyed() {
            return None;
        }
        let core = self.core();
        let generation = core.state.borrow().generation;

        let first_entry = self.metadata().first_entry;
        let absolute_before = match self.window() {
            (after, before) if after >= 0 => before as f64,
            _ => core.clock.now_secs(),
        };
        if first_entry.is_some_and(|first| first as f64 > absolute_before) {
            debug!(chart = %self.id(), ?first_entry, "window ends before the first entry, skipping fetch");
            self.update_attribute("loaded", true);
            self.clear_fetch_timeout();
            return None;
        }

        self.trigger(Event::StartFetch);
        let mut patch = Map::new();
        patch.insert("loading".into(), json!(true));
        patch.insert("fetchStartedAt".into(), json!(core.clock.now_ms()));
        self.update_attributes(patch);
        if self.is_destroyed() {
            return None;
        }

        let weak = self.downgrade();
        let timeout = Timer::after(core.config.request_timeout(), move || {
            if let Some(chart) = chart_of(&weak) {
                chart.on_request_timeout();
            }
        });

        let token = CancellationToken::new();
        let mut state = core.state.borrow_mut();
        if state.generation != generation {
            token.cancel();
        }
        timer::clear(&mut state.fetch_timeout);
        state.fetch_timeout = Some(timeout);
        state.cancel = Some(token.clone());
        Some(token)
    }

    fn on_request_timeout(&self) {
        {
            let mut state = self.core().state.borrow_mut();
            state.fetch_timeout = None;
            state.timed_out = true;
        }
        warn!(chart = %self.id(), "request is taking longer than the timeout");
        self.trigger(Event::Timeout(true));
    }

    /// Drop the timeout timer, closing a `Timeout(true)` with `Timeout(false)`.
    pub(super) fn clear_fetch_timeout(&self) {
        let timed_out = {
            let mut state = self.core().state.borrow_mut();
            timer::clear(&mut state.fetch_timeout);
            std::mem::take(&mut state.timed_out)
        };
        if timed_out {
            self.trigger(Event::Timeout(false));
        }
    }

    async fn run(self, token: CancellationToken) {
        let outcome = self.request(&token).await.and_then(Payload::from_raw);
        if self.is_destroyed() {
            return;
        }
        match outcome {
            Ok(payload) => self.done_fetch(payload),
            Err(error) => self.fail_fetch(error),
        }
        if self.is_destroyed() {
            return;
        }
        self.settle_pending();
        self.finish_fetch();
    }

    async fn request(&self, token: &CancellationToken) -> Result<Value, FetchError> {
        let metadata = self.core().metadata.fetch(self);
        tokio::select! {
            biased;
            _ = token.cancelled() => return Err(FetchError::Aborted),
            refreshed = metadata => refreshed?,
        }
        if self.is_destroyed() {
            return Err(FetchError::Aborted);
        }
        self.update_metadata();

        let data = self.core().fetcher.fetch(self, token.clone());
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(FetchError::Aborted),
            raw = data => raw,
        }
    }

    fn update_metadata(&self) {
        let metadata = self.metadata();
        {
            let mut state = self.core().state.borrow_mut();
            if state
                .prev_metadata
                .as_ref()
                .is_some_and(|prev| Rc::ptr_eq(prev, &metadata))
            {
                return;
            }
            state.prev_metadata = Some(metadata.clone());
        }

        debug!(chart = %self.id(), "metadata changed");
        self.trigger(Event::MetadataChanged);
        if self.get_bool("composite") {
            self.set_attributes(super::filters::initial_attributes(self, &metadata));
        }
    }

    fn done_fetch(&self, next: Payload) {
        let (payload, prev) = {
            let mut state = self.core().state.borrow_mut();
            state.backoff_ms = None;
            let prev = state.payload.clone();
            let payload = Rc::new(prev.merge(next));
            state.payload = payload.clone();
            state.closest_row.invalidate();
            (payload, prev)
        };

        let mut patch = Map::new();
        patch.insert("loaded".into(), json!(true));
        patch.insert("loading".into(), json!(false));
        patch.insert("updatedAt".into(), json!(self.core().clock.now_ms()));
        self.update_attributes(patch);

        self.trigger(Event::SuccessFetch { payload, prev });
    }

    fn fail_fetch(&self, error: FetchError) {
        self.backoff();
        self.update_attribute("loading", false);
        if error.is_aborted() {
            debug!(chart = %self.id(), "fetch aborted");
        } else {
            warn!(chart = %self.id(), %error, backoff_ms = ?self.backoff_ms(), "fetch failed");
            self.trigger(Event::FailFetch(error));
        }
    }

    fn finish_fetch(&self) {
        self.clear_fetch_timeout();
        self.trigger(Event::FinishFetch);
        self.start_autofetch();
    }
}

//! src/chart.rs
//!
//! Charts: nodes that own a payload, fetch it through the injected fetcher and
//! keep it fresh on a drift-corrected schedule.
//!
//! A [`Chart`] is a typed view over a [`Node`] whose kind is `Chart`; it derefs
//! to the node, so every attribute, query and event operation is available on
//! it directly. Private fetch state (payload, timers, cancellation handle,
//! backoff) lives in [`ChartCore`] and is only reachable through the methods
//! below.

mod fetch;
pub mod filters;
mod scheduler;

use std::cell::RefCell;
use std::ops::Deref;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use futures::future::{LocalBoxFuture, Shared};
use serde_json::{Map, Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use fetch::FetchHandle;
pub use filters::{GroupBySelection, NodeSelection};

use crate::api::SharedFetcher;
use crate::clock::Clock;
use crate::closest_row::ClosestRowCache;
use crate::config::SdkConfig;
use crate::metadata::{Metadata, MetadataDecorator};
use crate::node::{Event, Matcher, Node, NodeKind, NodeQuery, WeakNode};
use crate::payload::{Payload, Row};
use crate::timer::{self, Timer};
use crate::units::{self, ConversionInput, ConversionMethod, UnitsConversion};

/// Relative window used when no node in the chain sets `after`.
pub const DEFAULT_AFTER: i64 = -600;

/// Rendering side of a chart, supplied by the embedding application.
pub trait ChartUi {
    fn render(&self);

    fn unmount(&self);
}

/// Keyboard/mouse collaborator, attached while the chart is focused.
pub trait KeyboardListener {
    fn attach(&self, chart: &Chart);

    fn detach(&self);
}

/// Per-chart overrides of the sdk-wide collaborators.
#[derive(Clone, Default)]
pub struct ChartOptions {
    pub fetcher: Option<SharedFetcher>,
    pub metadata: Option<Rc<dyn MetadataDecorator>>,
}

type Lane = Shared<LocalBoxFuture<'static, ()>>;

#[derive(Default)]
struct ChartState {
    payload: Rc<Payload>,
    cancel: Option<CancellationToken>,
    fetch_timeout: Option<Timer>,
    timed_out: bool,
    autofetch_timer: Option<Timer>,
    backoff_ms: Option<u64>,
    prev_metadata: Option<Rc<Metadata>>,
    closest_row: ClosestRowCache,
    ui: Option<Rc<dyn ChartUi>>,
    keyboard: Option<Rc<dyn KeyboardListener>>,
    last_fetch: Option<(i64, i64)>,
    /// The newest fetch future; awaited by follow-up requests.
    lane: Option<Lane>,
    /// Fetches started or queued and not yet settled (at most two).
    pending: usize,
    /// Bumped by `cancel_fetch`; a queued follow-up from an older value is dropped.
    generation: u64,
}

pub(crate) struct ChartCore {
    fetcher: SharedFetcher,
    metadata: Rc<dyn MetadataDecorator>,
    config: Rc<SdkConfig>,
    clock: Clock,
    state: RefCell<ChartState>,
}

impl ChartCore {
    pub(crate) fn new(
        fetcher: SharedFetcher,
        metadata: Rc<dyn MetadataDecorator>,
        config: Rc<SdkConfig>,
        clock: Clock,
    ) -> Self {
        Self {
            fetcher,
            metadata,
            config,
            clock,
            state: RefCell::new(ChartState::default()),
        }
    }
}

/// Runtime attributes every chart starts with unless given explicitly.
pub(crate) fn with_runtime_defaults(mut attributes: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in [
        ("loaded", json!(false)),
        ("loading", json!(false)),
        ("updatedAt", json!(0)),
        ("fetchStartedAt", json!(0)),
    ] {
        attributes.entry(key).or_insert(value);
    }
    attributes
}

fn chart_of(weak: &WeakNode) -> Option<Chart> {
    weak.upgrade().and_then(|node| node.as_chart())
}

/// Run a collaborator callback, logging instead of unwinding through teardown.
fn guarded(what: &'static str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        warn!(step = what, "collaborator panicked during chart teardown");
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Chart {
    node: Node,
}

impl Deref for Chart {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl std::fmt::Debug for Chart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Chart").field(&self.node).finish()
    }
}

impl Chart {
    pub(crate) fn from_node(node: Node) -> Option<Chart> {
        matches!(node.0.kind, NodeKind::Chart(_)).then_some(Chart { node })
    }

    fn core(&self) -> &ChartCore {
        match &self.node.0.kind {
            NodeKind::Chart(core) => core,
            NodeKind::Container => unreachable!("chart handle over a container node"),
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Wire the attribute-driven transitions. Called once by the sdk factory.
    pub(crate) fn install(&self) {
        let weak = self.downgrade();
        let _ = self.on_attribute_change("autofetch", move |change| {
            let Some(chart) = chart_of(&weak) else { return };
            if change.next.as_bool() == Some(true) {
                chart.start_autofetch();
            } else {
                chart.stop_autofetch();
            }
        });

        let weak = self.downgrade();
        let _ = self.on_attribute_change("active", move |change| {
            let Some(chart) = chart_of(&weak) else { return };
            if change.next.as_bool() != Some(true) {
                chart.stop_autofetch();
            } else if chart.get_bool("autofetch") {
                chart.start_autofetch();
            }
        });

        let weak = self.downgrade();
        let _ = self.on_attribute_change("focused", move |change| {
            let Some(chart) = chart_of(&weak) else { return };
            let keyboard = chart.core().state.borrow().keyboard.clone();
            if let Some(keyboard) = keyboard {
                if change.next.as_bool() == Some(true) {
                    keyboard.attach(&chart);
                } else {
                    keyboard.detach();
                }
            }
            chart.core().state.borrow_mut().closest_row.invalidate();
        });

        let weak = self.downgrade();
        let _ = self.on(crate::node::EventKind::Fetch, move |_| {
            if let Some(chart) = chart_of(&weak) {
                tokio::task::spawn_local(chart.fetch_and_render());
            }
        });

        let weak = self.downgrade();
        let _ = self.on(crate::node::EventKind::Render, move |_| {
            if let Some(chart) = chart_of(&weak) {
                chart.render();
            }
        });
    }

    // --- collaborators ---

    pub fn metadata(&self) -> Rc<Metadata> {
        self.core().metadata.get(self)
    }

    pub fn payload(&self) -> Rc<Payload> {
        self.core().state.borrow().payload.clone()
    }

    pub fn ui(&self) -> Option<Rc<dyn ChartUi>> {
        self.core().state.borrow().ui.clone()
    }

    /// Attach (or detach with `None`) the rendering adapter.
    pub fn set_ui(&self, ui: Option<Rc<dyn ChartUi>>) {
        let mounted = ui.is_some();
        self.core().state.borrow_mut().ui = ui;
        if let Some(sdk) = self.sdk() {
            let node = self.node.clone();
            sdk.trigger(if mounted {
                Event::MountChartUi(node)
            } else {
                Event::UnmountChartUi(node)
            });
        }
    }

    pub fn set_keyboard_listener(&self, keyboard: Option<Rc<dyn KeyboardListener>>) {
        let previous = std::mem::replace(&mut self.core().state.borrow_mut().keyboard, keyboard);
        if let Some(previous) = previous {
            previous.detach();
        }
        if self.get_bool("focused") {
            let keyboard = self.core().state.borrow().keyboard.clone();
            if let Some(keyboard) = keyboard {
                keyboard.attach(self);
            }
        }
    }

    /// Draw through the mounted ui, then announce it with `Rendered`.
    pub fn render(&self) {
        if let Some(ui) = self.ui() {
            ui.render();
            self.trigger(Event::Rendered);
        }
    }

    /// Fetch, then render whatever the fetch left behind.
    pub fn fetch_and_render(&self) -> LocalBoxFuture<'static, ()> {
        let handle = self.fetch();
        let weak = self.downgrade();
        Box::pin(async move {
            handle.await;
            if let Some(chart) = chart_of(&weak) {
                chart.render();
            }
        })
    }

    // --- interaction ---

    pub fn activate(&self) {
        self.set_active(true);
    }

    pub fn deactivate(&self) {
        self.set_active(false);
    }

    fn set_active(&self, active: bool) {
        if self.is_destroyed() {
            return;
        }
        self.update_attribute("active", active);
        if let Some(sdk) = self.sdk() {
            sdk.trigger(Event::Active {
                node: self.node.clone(),
                active,
            });
        }
    }

    pub fn focus(&self) {
        self.update_attribute("focused", true);
    }

    pub fn blur(&self) {
        self.update_attribute("focused", false);
    }

    /// Nodes sharing this chart's sync group for `pattern`.
    ///
    /// Just this chart when it does not match `pattern` or no ancestor declares
    /// it; otherwise every inherited match under the nearest declaring ancestor.
    pub fn get_applicable_nodes(&self, pattern: Value) -> Vec<Node> {
        let matcher = Matcher::pattern(pattern);
        if !self.matches(&matcher) {
            return vec![self.node.clone()];
        }
        match self.get_ancestor(&matcher) {
            Some(ancestor) => ancestor
                .get_nodes(matcher, NodeQuery::inherited())
                .collect(),
            None => vec![self.node.clone()],
        }
    }

    pub fn hover(&self) {
        self.set_hovering(true);
    }

    pub fn unhover(&self) {
        self.set_hovering(false);
    }

    fn set_hovering(&self, hovering: bool) {
        if self.is_destroyed() {
            return;
        }
        for node in self.get_applicable_nodes(json!({ "syncHover": true })) {
            node.update_attribute("hovering", hovering);
        }
        if let Some(sdk) = self.sdk() {
            let node = self.node.clone();
            sdk.trigger(if hovering {
                Event::HoverChart(node)
            } else {
                Event::BlurChart(node)
            });
        }
    }

    /// Pan the window (epoch seconds, or relative seconds when `after < 0`).
    pub fn move_x(&self, after: i64, before: i64) {
        if self.is_destroyed() {
            return;
        }
        for node in self.get_applicable_nodes(json!({ "syncPanning": true })) {
            let mut window = Map::new();
            window.insert("after".into(), json!(after));
            window.insert("before".into(), json!(before));
            node.update_attributes(window);
        }
        if let Some(sdk) = self.sdk() {
            sdk.trigger(Event::MoveX(self.node.clone()));
        }
    }

    /// `(after, before)` in seconds, from the attributes.
    pub fn window(&self) -> (i64, i64) {
        (
            self.get_i64("after").unwrap_or(DEFAULT_AFTER),
            self.get_i64("before").unwrap_or(0),
        )
    }

    /// Absolute `(after, before)` in epoch milliseconds.
    pub fn date_window(&self) -> (i64, i64) {
        match self.window() {
            (after, _) if after < 0 => {
                let now = self.core().clock.now_ms();
                (now + after * 1000, now)
            }
            (after, before) => (after * 1000, before * 1000),
        }
    }

    pub fn last_fetch(&self) -> Option<(i64, i64)> {
        self.core().state.borrow().last_fetch
    }

    pub fn set_last_fetch(&self, window: (i64, i64)) {
        self.core().state.borrow_mut().last_fetch = Some(window);
    }

    /// Row closest to `timestamp` (ms) in the current payload.
    pub fn closest_row(&self, timestamp: i64) -> Option<Row> {
        let mut guard = self.core().state.borrow_mut();
        let state = &mut *guard;
        let index = state.closest_row.get(state.payload.rows(), timestamp)?;
        state.payload.rows().get(index).cloned()
    }

    // --- units ---

    /// Select the conversion for `[min, max]` and store it on the chart.
    pub fn update_units_conversion(&self, min: f64, max: f64) -> UnitsConversion {
        let metadata = self.metadata();
        let attributes = self.get_attributes();
        let desired_units = attributes
            .get("desiredUnits")
            .and_then(Value::as_str)
            .unwrap_or("auto");
        let conversion = units::select(
            &ConversionInput {
                units: &metadata.units,
                desired_units,
                attributes: &attributes,
            },
            min,
            max,
        );

        let mut patch = Map::new();
        patch.insert("unitsConversionMethod".into(), json!(conversion.method.key()));
        patch.insert("unitsConversionDivider".into(), json!(conversion.divider));
        patch.insert(
            "unitsConversionFractionDigits".into(),
            json!(conversion.fraction_digits.map_or(-1, |digits| digits as i64)),
        );
        patch.insert("unitsCurrent".into(), json!(conversion.unit));
        self.set_attributes(patch);

        conversion
    }

    /// `value` converted and formatted with the stored conversion.
    pub fn converted_value(&self, value: f64) -> String {
        let method = self
            .get_str("unitsConversionMethod")
            .map_or(ConversionMethod::Original, |key| ConversionMethod::parse(&key));
        let divider = self.get_f64("unitsConversionDivider");
        let fraction_digits = self
            .get_i64("unitsConversionFractionDigits")
            .and_then(|digits| usize::try_from(digits).ok());

        units::format_value(units::convert(&method, value, divider), fraction_digits)
    }

    // --- lifecycle ---

    /// Tear down fetch state and collaborators, then release the node.
    ///
    /// Every step runs even if a collaborator panics; calling it again is a
    /// no-op.
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        info!(chart = %self.id(), "destroying chart");

        self.cancel_fetch();
        self.stop_autofetch();
        self.clear_fetch_timeout();

        let (keyboard, ui) = {
            let mut state = self.core().state.borrow_mut();
            timer::clear(&mut state.autofetch_timer);
            state.lane = None;
            state.pending = 0;
            (state.keyboard.take(), state.ui.take())
        };
        if let Some(keyboard) = keyboard {
            guarded("keyboard detach", || keyboard.detach());
        }
        if let Some(ui) = ui {
            guarded("ui unmount", || ui.unmount());
            if let Some(sdk) = self.sdk() {
                sdk.trigger(Event::UnmountChartUi(self.node.clone()));
            }
        }

        self.node.release();

        let mut state = self.core().state.borrow_mut();
        state.payload = Rc::default();
        state.prev_metadata = None;
        state.closest_row.invalidate();
    }
}

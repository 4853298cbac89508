//! src/play.rs
//!
//! The play coordinator: turns `autofetch` on and off across the tree as
//! charts become active, are hovered, panned, or the window loses focus, and
//! drives a periodic render while anything is live.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::{Value, json};
use tracing::debug;

use crate::node::{Event, EventKind, Matcher, Node, NodeQuery, Subscription};
use crate::sdk::Sdk;
use crate::timer::{self, Timer};

/// Whether the host window has focus. Shared between the coordinator and
/// whoever observes the window.
#[derive(Clone, Debug)]
pub struct WindowFocus(Rc<Cell<bool>>);

impl WindowFocus {
    pub fn new(focused: bool) -> Self {
        Self(Rc::new(Cell::new(focused)))
    }

    pub fn is_focused(&self) -> bool {
        self.0.get()
    }

    fn set(&self, focused: bool) {
        self.0.set(focused);
    }
}

impl Default for WindowFocus {
    fn default() -> Self {
        Self::new(true)
    }
}

struct PlayInner {
    sdk: Sdk,
    focus: WindowFocus,
    render_timer: RefCell<Option<Timer>>,
    subscriptions: RefCell<Vec<Subscription>>,
}

pub struct Play {
    inner: Rc<PlayInner>,
}

impl Play {
    /// Subscribe to the sdk's `Active`, `HoverChart`, `BlurChart` and `MoveX`
    /// events. Must be called inside a `LocalSet`.
    pub fn start(sdk: &Sdk, focus: WindowFocus) -> Play {
        let inner = Rc::new(PlayInner {
            sdk: sdk.clone(),
            focus,
            render_timer: RefCell::new(None),
            subscriptions: RefCell::new(Vec::new()),
        });

        let subscriptions = [
            EventKind::Active,
            EventKind::HoverChart,
            EventKind::BlurChart,
            EventKind::MoveX,
        ]
        .into_iter()
        .map(|kind| {
            let weak = Rc::downgrade(&inner);
            sdk.on(kind, move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_event(event);
                }
            })
        })
        .collect();
        *inner.subscriptions.borrow_mut() = subscriptions;

        Play { inner }
    }

    pub fn focus_state(&self) -> &WindowFocus {
        &self.inner.focus
    }

    /// The window lost focus: pause every node that opted out of
    /// background autofetch.
    pub fn blur(&self) {
        self.inner.focus.set(false);
        self.inner.set_paused(true);
    }

    pub fn focus(&self) {
        self.inner.focus.set(true);
        self.inner.set_paused(false);
    }

    pub fn is_rendering(&self) -> bool {
        self.inner.render_timer.borrow().is_some()
    }

    pub fn stop(self) {
        for subscription in self.inner.subscriptions.borrow_mut().drain(..) {
            subscription.unsubscribe();
        }
        timer::clear(&mut self.inner.render_timer.borrow_mut());
    }
}

fn flag(attributes: &serde_json::Map<String, Value>, key: &str) -> bool {
    attributes.get(key).and_then(Value::as_bool).unwrap_or(false)
}

impl PlayInner {
    fn on_event(self: &Rc<Self>, event: &Event) {
        let (node, pattern) = match event {
            Event::Active { node, .. } => {
                self.autofetch_if_active(node);
                return;
            }
            Event::HoverChart(node) | Event::BlurChart(node) => (node, json!({ "syncHover": true })),
            Event::MoveX(node) => (node, json!({ "syncPanning": true })),
            _ => return,
        };
        let Some(chart) = node.as_chart() else { return };
        for node in chart.get_applicable_nodes(pattern) {
            self.autofetch_if_active(&node);
        }
    }

    fn set_paused(self: &Rc<Self>, paused: bool) {
        let nodes: Vec<Node> = self
            .sdk
            .get_nodes(
                Matcher::pattern(json!({ "autofetchOnWindowBlur": false })),
                NodeQuery::inherited(),
            )
            .collect();
        for node in nodes {
            node.update_attribute("paused", paused);
            self.autofetch_if_active(&node);
        }
    }

    /// Recompute `autofetch` for `node`: only relative windows (a chart's
    /// default) that are neither hovered nor paused poll, and charts
    /// additionally need to be active. An active chart that stops polling is fetched once more when its window
    /// moved since the last such fetch.
    fn autofetch_if_active(self: &Rc<Self>, node: &Node) {
        let attributes = node.get_attributes();
        let relative = match node.as_chart() {
            Some(chart) => chart.window().0 < 0,
            None => attributes
                .get("after")
                .and_then(Value::as_i64)
                .is_some_and(|after| after < 0),
        };
        let autofetch = relative && !flag(&attributes, "hovering") && !flag(&attributes, "paused");

        let Some(chart) = node.as_chart() else {
            node.update_attribute("autofetch", autofetch);
            return;
        };

        let active = flag(&attributes, "active");
        let autofetch = autofetch && active;
        if autofetch {
            self.ensure_render_loop();
        }
        chart.update_attribute("autofetch", autofetch);

        if active {
            chart.trigger(Event::Render);
        }

        if active && !autofetch {
            let window = chart.date_window();
            let moved = chart
                .last_fetch()
                .is_none_or(|(after, before)| after != window.0 || before != window.1);
            if !flag(&attributes, "loaded") || moved {
                debug!(chart = %chart.id(), ?window, "refetching stopped chart");
                chart.set_last_fetch(window);
                chart.trigger(Event::Fetch);
            }
        }
    }

    fn ensure_render_loop(self: &Rc<Self>) {
        if self.render_timer.borrow().is_none() {
            self.render_tick(true);
        }
    }

    /// Render every live chart, then re-arm while any chart autofetches.
    fn render_tick(self: &Rc<Self>, keep_alive: bool) {
        let focused = self.focus.is_focused();
        let mut any_autofetch = false;

        let charts: Vec<_> = self.sdk.charts().collect();
        for chart in charts {
            let attributes = chart.get_attributes();
            any_autofetch |= flag(&attributes, "autofetch");
            if flag(&attributes, "loaded")
                && flag(&attributes, "active")
                && (focused || flag(&attributes, "autofetchOnWindowBlur"))
            {
                chart.trigger(Event::Render);
            }
        }

        let next = (keep_alive || any_autofetch).then(|| {
            let weak: Weak<PlayInner> = Rc::downgrade(self);
            Timer::after(self.sdk.config().render_interval(), move || {
                if let Some(inner) = weak.upgrade() {
                    inner.render_tick(false);
                }
            })
        });
        *self.render_timer.borrow_mut() = next;
    }
}

//! src/node/events.rs
//!
//! Typed events carried by node and sdk buses.

use std::rc::Rc;

use serde_json::Value;

use super::Node;
use crate::error::FetchError;
use crate::payload::Payload;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    StartFetch,
    SuccessFetch,
    FailFetch,
    FinishFetch,
    Timeout,
    MetadataChanged,
    Fetch,
    Render,
    Rendered,
    Active,
    HoverChart,
    BlurChart,
    MoveX,
    PristineChanged,
    MountChartUi,
    UnmountChartUi,
}

#[derive(Clone, Debug)]
pub enum Event {
    StartFetch,
    SuccessFetch {
        payload: Rc<Payload>,
        prev: Rc<Payload>,
    },
    FailFetch(FetchError),
    FinishFetch,
    /// `true` when the request outlived the advisory timeout, `false` when a
    /// timed-out request finally settled.
    Timeout(bool),
    MetadataChanged,
    /// Ask the chart to refetch (and re-render) now.
    Fetch,
    Render,
    Rendered,
    Active {
        node: Node,
        active: bool,
    },
    HoverChart(Node),
    BlurChart(Node),
    MoveX(Node),
    PristineChanged {
        node: Node,
        key: String,
        next: Value,
        prev: Value,
    },
    MountChartUi(Node),
    UnmountChartUi(Node),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::StartFetch => EventKind::StartFetch,
            Event::SuccessFetch { .. } => EventKind::SuccessFetch,
            Event::FailFetch(_) => EventKind::FailFetch,
            Event::FinishFetch => EventKind::FinishFetch,
            Event::Timeout(_) => EventKind::Timeout,
            Event::MetadataChanged => EventKind::MetadataChanged,
            Event::Fetch => EventKind::Fetch,
            Event::Render => EventKind::Render,
            Event::Rendered => EventKind::Rendered,
            Event::Active { .. } => EventKind::Active,
            Event::HoverChart(_) => EventKind::HoverChart,
            Event::BlurChart(_) => EventKind::BlurChart,
            Event::MoveX(_) => EventKind::MoveX,
            Event::PristineChanged { .. } => EventKind::PristineChanged,
            Event::MountChartUi(_) => EventKind::MountChartUi,
            Event::UnmountChartUi(_) => EventKind::UnmountChartUi,
        }
    }
}

/// Payload of attribute listeners.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeChange {
    pub key: String,
    pub next: Value,
    pub prev: Value,
}

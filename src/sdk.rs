//! src/sdk.rs
//!
//! The sdk: root container, sdk-wide event bus and the default collaborators
//! every chart is created with.

use std::rc::{Rc, Weak};

use serde_json::{Map, Value};
use tracing::debug;

use crate::api::SharedFetcher;
use crate::chart::{self, Chart, ChartCore, ChartOptions};
use crate::clock::Clock;
use crate::config::SdkConfig;
use crate::error::{Result, SdkError};
use crate::metadata::MetadataDecorator;
use crate::node::{Event, EventKind, Listeners, Matcher, Node, NodeKind, NodeQuery, NodeWalk, Subscription};

pub(crate) struct SdkInner {
    root: Node,
    events: Listeners<EventKind, Event>,
    fetcher: SharedFetcher,
    metadata: Rc<dyn MetadataDecorator>,
    config: Rc<SdkConfig>,
    clock: Clock,
}

#[derive(Clone)]
pub struct Sdk(Rc<SdkInner>);

fn object(attributes: Value) -> Result<Map<String, Value>> {
    match attributes {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(SdkError::MalformedPatch(other.to_string())),
    }
}

impl Sdk {
    pub fn new(config: SdkConfig, fetcher: SharedFetcher, metadata: Rc<dyn MetadataDecorator>) -> Self {
        Self::with_clock(config, fetcher, metadata, Clock::system())
    }

    pub fn with_clock(
        config: SdkConfig,
        fetcher: SharedFetcher,
        metadata: Rc<dyn MetadataDecorator>,
        clock: Clock,
    ) -> Self {
        let root_attributes = config.attributes.clone();
        Sdk(Rc::new_cyclic(|sdk: &Weak<SdkInner>| SdkInner {
            root: Node::create(NodeKind::Container, sdk.clone(), root_attributes),
            events: Listeners::new(),
            fetcher,
            metadata,
            config: Rc::new(config),
            clock,
        }))
    }

    pub(crate) fn from_inner(inner: Rc<SdkInner>) -> Self {
        Sdk(inner)
    }

    pub fn root(&self) -> &Node {
        &self.0.root
    }

    pub fn config(&self) -> &SdkConfig {
        &self.0.config
    }

    pub fn clock(&self) -> Clock {
        self.0.clock
    }

    /// Create a chart under `parent` (the root when `None`).
    pub fn make_chart(&self, attributes: Value, parent: Option<&Node>) -> Result<Chart> {
        self.make_chart_with(attributes, parent, ChartOptions::default())
    }

    pub fn make_chart_with(&self, attributes: Value, parent: Option<&Node>, options: ChartOptions) -> Result<Chart> {
        let attributes = chart::with_runtime_defaults(object(attributes)?);
        let core = ChartCore::new(
            options.fetcher.unwrap_or_else(|| self.0.fetcher.clone()),
            options.metadata.unwrap_or_else(|| self.0.metadata.clone()),
            self.0.config.clone(),
            self.0.clock,
        );
        let node = Node::create(NodeKind::Chart(core), Rc::downgrade(&self.0), attributes);
        let chart = node
            .as_chart()
            .ok_or(SdkError::InvalidState("chart node without chart state"))?;
        chart.install();

        parent.unwrap_or(&self.0.root).append_child(&node)?;
        debug!(chart = %chart.id(), "chart created");
        Ok(chart)
    }

    pub fn make_container(&self, attributes: Value, parent: Option<&Node>) -> Result<Node> {
        let node = Node::create(NodeKind::Container, Rc::downgrade(&self.0), object(attributes)?);
        parent.unwrap_or(&self.0.root).append_child(&node)?;
        Ok(node)
    }

    pub fn get_nodes(&self, matcher: Matcher, query: NodeQuery) -> NodeWalk {
        self.0.root.get_nodes(matcher, query)
    }

    /// Every live chart in the tree.
    pub fn charts(&self) -> impl Iterator<Item = Chart> + use<> {
        self.get_nodes(Matcher::predicate(|node, _| node.is_chart()), NodeQuery::default())
            .filter_map(|node| node.as_chart())
    }

    pub fn on<F>(&self, kind: EventKind, f: F) -> Subscription
    where
        F: Fn(&Event) + 'static,
    {
        self.0.events.on(kind, f)
    }

    pub fn trigger(&self, event: Event) {
        self.0.events.trigger(&event.kind(), &event);
    }

    /// Destroy the whole tree and drop every sdk listener.
    pub fn destroy(&self) {
        self.0.root.destroy();
        self.0.events.off_all();
    }
}

impl std::fmt::Debug for Sdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sdk").field("root", &self.0.root).finish()
    }
}

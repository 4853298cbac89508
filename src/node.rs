//! src/node.rs
//!
//! Hierarchical attribute-and-event container shared by charts and containers.
//!
//! A node owns its children exclusively and refers to its parent weakly.
//! Attribute reads fall back to the nearest ancestor that defines the key.
//! Every mutation and dispatch is synchronous; no `RefCell` borrow is held
//! while listeners run, so listeners may freely re-enter the tree (including
//! destroying the node that triggered them).

pub mod events;
pub mod listeners;
pub mod matcher;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};
use uuid::Uuid;

pub use events::{AttributeChange, Event, EventKind};
pub use listeners::{Listeners, Subscription};
pub use matcher::{Matcher, NodeQuery, NodeWalk};

use crate::chart::{Chart, ChartCore};
use crate::error::{Result, SdkError};
use crate::pristine::{PRISTINE, PRISTINE_COMPOSITE, Pristine};
use crate::sdk::{Sdk, SdkInner};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeType {
    Chart,
    Container,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Chart => "chart",
            NodeType::Container => "container",
        }
    }
}

pub(crate) enum NodeKind {
    Container,
    Chart(ChartCore),
}

struct NodeState {
    parent: Weak<NodeInner>,
    children: Vec<Node>,
    attributes: Map<String, Value>,
}

pub(crate) struct NodeInner {
    id: Uuid,
    pub(crate) kind: NodeKind,
    sdk: Weak<SdkInner>,
    /// `None` once destroyed.
    state: RefCell<Option<NodeState>>,
    events: Listeners<EventKind, Event>,
    attribute_listeners: Listeners<String, AttributeChange>,
}

/// Shared handle to a tree node.
#[derive(Clone)]
pub struct Node(pub(crate) Rc<NodeInner>);

/// Non-owning node reference, used by timers and listeners.
#[derive(Clone, Default)]
pub struct WeakNode(Weak<NodeInner>);

impl WeakNode {
    /// The node, if it is still alive and not destroyed.
    pub fn upgrade(&self) -> Option<Node> {
        self.0
            .upgrade()
            .map(Node)
            .filter(|node| !node.is_destroyed())
    }
}

impl Node {
    pub(crate) fn create(kind: NodeKind, sdk: Weak<SdkInner>, attributes: Map<String, Value>) -> Node {
        Node(Rc::new(NodeInner {
            id: Uuid::new_v4(),
            kind,
            sdk,
            state: RefCell::new(Some(NodeState {
                parent: Weak::new(),
                children: Vec::new(),
                attributes,
            })),
            events: Listeners::new(),
            attribute_listeners: Listeners::new(),
        }))
    }

    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn node_type(&self) -> NodeType {
        match self.0.kind {
            NodeKind::Container => NodeType::Container,
            NodeKind::Chart(_) => NodeType::Chart,
        }
    }

    pub fn is_chart(&self) -> bool {
        self.node_type() == NodeType::Chart
    }

    /// Typed chart view of this node, if it is one.
    pub fn as_chart(&self) -> Option<Chart> {
        Chart::from_node(self.clone())
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.state.borrow().is_none()
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    pub fn sdk(&self) -> Option<Sdk> {
        self.0.sdk.upgrade().map(Sdk::from_inner)
    }

    // --- tree ---

    pub fn parent(&self) -> Option<Node> {
        self.0
            .state
            .borrow()
            .as_ref()
            .and_then(|state| state.parent.upgrade())
            .map(Node)
    }

    pub fn children(&self) -> Vec<Node> {
        self.0
            .state
            .borrow()
            .as_ref()
            .map(|state| state.children.clone())
            .unwrap_or_default()
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Node> + use<> {
        std::iter::successors(self.parent(), Node::parent)
    }

    /// Take ownership of `child`, detaching it from its previous parent.
    pub fn append_child(&self, child: &Node) -> Result<()> {
        if self.is_destroyed() || child.is_destroyed() {
            return Err(SdkError::InvalidState("append_child on a destroyed node"));
        }
        if self == child || self.ancestors().any(|ancestor| &ancestor == child) {
            return Err(SdkError::Cycle);
        }

        if let Some(previous) = child.parent() {
            previous.remove_child(child);
        }

        if let Some(state) = self.0.state.borrow_mut().as_mut() {
            state.children.push(child.clone());
        }
        if let Some(state) = child.0.state.borrow_mut().as_mut() {
            state.parent = Rc::downgrade(&self.0);
        }
        Ok(())
    }

    /// Drop ownership of `child`. Returns whether it was a child of this node.
    pub fn remove_child(&self, child: &Node) -> bool {
        let removed = {
            let mut guard = self.0.state.borrow_mut();
            let Some(state) = guard.as_mut() else {
                return false;
            };
            let before = state.children.len();
            state.children.retain(|c| c != child);
            before != state.children.len()
        };
        if removed {
            if let Some(state) = child.0.state.borrow_mut().as_mut() {
                state.parent = Weak::new();
            }
        }
        removed
    }

    // --- attributes ---

    pub fn get_own_attribute(&self, key: &str) -> Option<Value> {
        self.0
            .state
            .borrow()
            .as_ref()
            .and_then(|state| state.attributes.get(key).cloned())
    }

    /// Own value, else the nearest ancestor's value.
    pub fn get_attribute(&self, key: &str) -> Option<Value> {
        std::iter::once(self.clone())
            .chain(self.ancestors())
            .find_map(|node| node.get_own_attribute(key))
    }

    pub fn get_own_attributes(&self) -> Map<String, Value> {
        self.0
            .state
            .borrow()
            .as_ref()
            .map(|state| state.attributes.clone())
            .unwrap_or_default()
    }

    /// Flattened view: ancestors' attributes overridden by descendants'.
    pub fn get_attributes(&self) -> Map<String, Value> {
        let mut chain: Vec<Node> = std::iter::once(self.clone()).chain(self.ancestors()).collect();
        chain.reverse();

        let mut merged = Map::new();
        for node in chain {
            if let Some(state) = node.0.state.borrow().as_ref() {
                merged.extend(state.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        merged
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get_attribute(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get_attribute(key).and_then(|v| v.as_f64()).map(|v| v as i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get_attribute(key).and_then(|v| v.as_f64())
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get_attribute(key)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// The snapshot set this node tracks filter edits into.
    pub fn pristine(&self) -> Pristine {
        if self.get_bool("composite") {
            PRISTINE_COMPOSITE
        } else {
            PRISTINE
        }
    }

    pub fn update_attribute(&self, key: &str, value: impl Into<Value>) {
        self.write_attributes(vec![(key.to_string(), value.into())], true);
    }

    pub fn update_attributes(&self, patch: Map<String, Value>) {
        self.write_attributes(patch.into_iter().collect(), true);
    }

    /// Like [`Node::update_attributes`] but without pristine tracking; used for
    /// values derived from metadata rather than from user edits.
    pub fn set_attributes(&self, patch: Map<String, Value>) {
        self.write_attributes(patch.into_iter().collect(), false);
    }

    /// Untyped entry point: rejects anything but a JSON object.
    pub fn apply_patch(&self, patch: Value) -> Result<()> {
        if self.is_destroyed() {
            return Err(SdkError::InvalidState("apply_patch on a destroyed node"));
        }
        match patch {
            Value::Object(map) => {
                self.update_attributes(map);
                Ok(())
            }
            other => Err(SdkError::MalformedPatch(other.to_string())),
        }
    }

    /// Clear an own value so the inherited one shows through again.
    pub fn remove_attribute(&self, key: &str) {
        let prev = self.get_attribute(key).unwrap_or(Value::Null);
        let removed = self
            .0
            .state
            .borrow_mut()
            .as_mut()
            .and_then(|state| state.attributes.remove(key));
        if removed.is_none() {
            return;
        }
        let next = self.get_attribute(key).unwrap_or(Value::Null);
        if next != prev {
            self.notify_attribute_change(&AttributeChange {
                key: key.to_string(),
                next,
                prev,
            });
        }
    }

    fn write_attributes(&self, entries: Vec<(String, Value)>, track_pristine: bool) {
        if self.is_destroyed() || entries.is_empty() {
            return;
        }
        let pristine = track_pristine.then(|| self.pristine());
        let currents: Vec<Value> = entries
            .iter()
            .map(|(key, _)| self.get_attribute(key).unwrap_or(Value::Null))
            .collect();

        let mut changes = Vec::new();
        {
            let mut guard = self.0.state.borrow_mut();
            let Some(state) = guard.as_mut() else {
                return;
            };
            for ((key, next), current) in entries.into_iter().zip(currents) {
                if let Some(pristine) = pristine {
                    let before = state.attributes.get(pristine.key()).cloned();
                    if pristine.update(&mut state.attributes, &key, &current, &next) {
                        changes.push(AttributeChange {
                            key: pristine.key().to_string(),
                            next: state.attributes[pristine.key()].clone(),
                            prev: before.unwrap_or(Value::Null),
                        });
                    }
                }
                state.attributes.insert(key.clone(), next.clone());
                if next != current {
                    changes.push(AttributeChange {
                        key,
                        next,
                        prev: current,
                    });
                }
            }
        }

        for change in &changes {
            self.notify_attribute_change(change);
        }
    }

    pub fn on_attribute_change<F>(&self, key: &str, f: F) -> Subscription
    where
        F: Fn(&AttributeChange) + 'static,
    {
        self.0.attribute_listeners.on(key.to_string(), f)
    }

    /// Fire attribute listeners for a change applied behind their back.
    pub(crate) fn notify_attribute_change(&self, change: &AttributeChange) {
        if self.is_destroyed() {
            return;
        }
        self.0.attribute_listeners.trigger(&change.key, change);
    }

    /// Direct access to own attributes, bypassing change detection.
    pub(crate) fn with_attributes_mut<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> Option<R> {
        self.0
            .state
            .borrow_mut()
            .as_mut()
            .map(|state| f(&mut state.attributes))
    }

    // --- queries ---

    /// Test against own + inherited attributes.
    pub fn matches(&self, matcher: &Matcher) -> bool {
        !self.is_destroyed() && matcher.test(self, &self.get_attributes())
    }

    /// Lazy walk over this subtree (self included) yielding matching nodes.
    pub fn get_nodes(&self, matcher: Matcher, query: NodeQuery) -> NodeWalk {
        NodeWalk::new(self.clone(), matcher, query)
    }

    /// Nearest ancestor whose own attributes match.
    pub fn get_ancestor(&self, matcher: &Matcher) -> Option<Node> {
        self.ancestors()
            .find(|ancestor| matcher.test(ancestor, &ancestor.get_own_attributes()))
    }

    // --- events ---

    pub fn on<F>(&self, kind: EventKind, f: F) -> Subscription
    where
        F: Fn(&Event) + 'static,
    {
        self.0.events.on(kind, f)
    }

    pub fn trigger(&self, event: Event) {
        if self.is_destroyed() {
            return;
        }
        self.0.events.trigger(&event.kind(), &event);
    }

    // --- lifecycle ---

    /// Destroy this node and its subtree. Charts run their full teardown first.
    /// Idempotent.
    pub fn destroy(&self) {
        match self.as_chart() {
            Some(chart) => chart.destroy(),
            None => self.release(),
        }
    }

    /// Detach from the parent, destroy children, drop attributes and listeners.
    pub(crate) fn release(&self) {
        if self.is_destroyed() {
            return;
        }
        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }

        let children = self
            .0
            .state
            .borrow_mut()
            .as_mut()
            .map(|state| std::mem::take(&mut state.children))
            .unwrap_or_default();
        for child in children {
            child.destroy();
        }

        self.0.state.borrow_mut().take();
        self.0.events.off_all();
        self.0.attribute_listeners.off_all();
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.0.id)
            .field("type", &self.node_type().as_str())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl std::fmt::Debug for WeakNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WeakNode")
    }
}

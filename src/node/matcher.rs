//! src/node/matcher.rs
//!
//! Predicates and declarative patterns for subtree queries.

use std::rc::Rc;

use serde_json::{Map, Value};

use super::Node;

type Predicate = dyn Fn(&Node, &Map<String, Value>) -> bool;

/// Either a predicate over `(node, attributes)` or a key/value pattern.
///
/// A pattern matches when every key equals the node's attribute; an unset
/// attribute only matches `null`.
#[derive(Clone)]
pub enum Matcher {
    Predicate(Rc<Predicate>),
    Pattern(Map<String, Value>),
}

impl Matcher {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Node, &Map<String, Value>) -> bool + 'static,
    {
        Matcher::Predicate(Rc::new(f))
    }

    /// Pattern from a JSON object; any other value yields the match-all pattern.
    pub fn pattern(pattern: Value) -> Self {
        match pattern {
            Value::Object(map) => Matcher::Pattern(map),
            _ => Matcher::Pattern(Map::new()),
        }
    }

    pub fn any() -> Self {
        Matcher::Pattern(Map::new())
    }

    pub fn test(&self, node: &Node, attributes: &Map<String, Value>) -> bool {
        match self {
            Matcher::Predicate(f) => f(node, attributes),
            Matcher::Pattern(pattern) => pattern
                .iter()
                .all(|(key, want)| attributes.get(key).unwrap_or(&Value::Null) == want),
        }
    }
}

impl From<Map<String, Value>> for Matcher {
    fn from(pattern: Map<String, Value>) -> Self {
        Matcher::Pattern(pattern)
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matcher::Predicate(_) => f.write_str("Matcher::Predicate(..)"),
            Matcher::Pattern(pattern) => f.debug_tuple("Matcher::Pattern").field(pattern).finish(),
        }
    }
}

/// Options for [`Node::get_nodes`].
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeQuery {
    /// Test against the inherited attribute view instead of own attributes.
    pub inherit: bool,
}

impl NodeQuery {
    pub fn inherited() -> Self {
        Self { inherit: true }
    }
}

/// Lazy depth-first, parent-before-children walk over a subtree.
///
/// Cloning an unconsumed walk restarts the traversal from its root.
#[derive(Clone, Debug)]
pub struct NodeWalk {
    stack: Vec<Node>,
    matcher: Matcher,
    query: NodeQuery,
}

impl NodeWalk {
    pub(crate) fn new(root: Node, matcher: Matcher, query: NodeQuery) -> Self {
        Self {
            stack: vec![root],
            matcher,
            query,
        }
    }
}

impl Iterator for NodeWalk {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        while let Some(node) = self.stack.pop() {
            if node.is_destroyed() {
                continue;
            }
            self.stack.extend(node.children().into_iter().rev());

            let attributes = if self.query.inherit {
                node.get_attributes()
            } else {
                node.get_own_attributes()
            };
            if self.matcher.test(&node, &attributes) {
                return Some(node);
            }
        }
        None
    }
}

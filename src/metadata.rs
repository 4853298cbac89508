//! src/metadata.rs
//!
//! Server-described static chart descriptions and the decorator that caches them.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::Deserialize;

use crate::chart::Chart;
use crate::error::FetchError;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DimensionInfo {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    pub id: String,
    pub title: String,
    /// Seconds between collected points.
    pub update_every: Option<u64>,
    pub units: String,
    /// Epoch seconds of the oldest stored point.
    pub first_entry: Option<i64>,
    pub dimensions: BTreeMap<String, DimensionInfo>,
}

/// Metadata source consumed by charts.
///
/// `get` is synchronous and answers from the cache; `fetch` refreshes it. A
/// chart notices new metadata by `Rc` identity, so implementations hand out
/// the same `Rc` until the description really changes.
pub trait MetadataDecorator {
    fn get(&self, chart: &Chart) -> Rc<Metadata>;

    fn fetch(&self, chart: &Chart) -> LocalBoxFuture<'static, Result<(), FetchError>>;
}

/// In-memory decorator keyed by the chart's `contextScope` (or `context`).
#[derive(Default)]
pub struct MetadataStore {
    entries: RefCell<HashMap<String, Rc<Metadata>>>,
    fallback: Rc<Metadata>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the description for `context`; charts see it as changed.
    pub fn insert(&self, context: impl Into<String>, metadata: Metadata) {
        self.entries
            .borrow_mut()
            .insert(context.into(), Rc::new(metadata));
    }

    pub fn context_of(chart: &Chart) -> Option<String> {
        chart
            .get_attribute("contextScope")
            .and_then(|scope| scope.get(0).and_then(|s| s.as_str().map(str::to_string)))
            .or_else(|| chart.get_str("context"))
    }
}

impl MetadataDecorator for MetadataStore {
    fn get(&self, chart: &Chart) -> Rc<Metadata> {
        Self::context_of(chart)
            .and_then(|context| self.entries.borrow().get(&context).cloned())
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn fetch(&self, _chart: &Chart) -> LocalBoxFuture<'static, Result<(), FetchError>> {
        Box::pin(async { Ok(()) })
    }
}

impl<T: MetadataDecorator + ?Sized> MetadataDecorator for Rc<T> {
    fn get(&self, chart: &Chart) -> Rc<Metadata> {
        (**self).get(chart)
    }

    fn fetch(&self, chart: &Chart) -> LocalBoxFuture<'static, Result<(), FetchError>> {
        (**self).fetch(chart)
    }
}

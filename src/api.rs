//! src/api.rs
//!
//! The data fetch seam: anything that turns a chart into a raw payload.

pub mod http;
pub mod query;

use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::chart::Chart;
use crate::error::FetchError;

pub use http::HttpFetcher;

/// Fetch the raw (snake_case) payload for `chart`.
///
/// Implementations should stop work once `cancel` fires; the chart also races
/// the returned future against the token, so ignoring it is safe.
pub trait DataFetcher {
    fn fetch(&self, chart: &Chart, cancel: CancellationToken) -> LocalBoxFuture<'static, Result<Value, FetchError>>;
}

impl<F, Fut> DataFetcher for F
where
    F: Fn(&Chart, CancellationToken) -> Fut,
    Fut: Future<Output = Result<Value, FetchError>> + 'static,
{
    fn fetch(&self, chart: &Chart, cancel: CancellationToken) -> LocalBoxFuture<'static, Result<Value, FetchError>> {
        Box::pin(self(chart, cancel))
    }
}

/// Shared, type-erased fetcher as stored by the sdk and charts.
pub type SharedFetcher = Rc<dyn DataFetcher>;

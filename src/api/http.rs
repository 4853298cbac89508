//! src/api/http.rs
//!
//! Data fetcher talking to a live agent over http.

use futures::future::LocalBoxFuture;
use reqwest::Url;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::DataFetcher;
use super::query::data_query;
use crate::chart::Chart;
use crate::error::FetchError;

#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    host: String,
}

impl HttpFetcher {
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), host)
    }

    pub fn with_client(client: reqwest::Client, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
        }
    }

    /// Full request url for `chart` as it is configured right now.
    pub fn data_url(&self, chart: &Chart) -> Result<Url, FetchError> {
        let params = data_query(&chart.get_attributes());
        Url::parse_with_params(&format!("{}/api/v2/data", self.host), &params)
            .map_err(|err| FetchError::Network(err.to_string()))
    }
}

impl DataFetcher for HttpFetcher {
    fn fetch(&self, chart: &Chart, cancel: CancellationToken) -> LocalBoxFuture<'static, Result<Value, FetchError>> {
        let client = self.client.clone();
        let url = self.data_url(chart);
        Box::pin(async move {
            let url = url?;
            debug!(%url, "requesting chart data");
            let request = async {
                let response = client.get(url).send().await?.error_for_status()?;
                Ok::<_, FetchError>(response.json::<Value>().await?)
            };
            tokio::select! {
                _ = cancel.cancelled() => Err(FetchError::Aborted),
                result = request => result,
            }
        })
    }
}

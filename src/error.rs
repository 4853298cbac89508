//! src/error.rs
//!
//! Error types shared by the node tree, the fetch lifecycle and the fetchers.

use thiserror::Error;

/// Failure of a single metadata or data request.
///
/// `Clone` so the error can travel inside `Event::FailFetch` to every listener.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request was cancelled through its token. Never surfaced as `failFetch`.
    #[error("request aborted")]
    Aborted,
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected http status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Decode(String),
}

impl FetchError {
    /// The abort-signal marker: cancellations are expected and silent.
    pub fn is_aborted(&self) -> bool {
        matches!(self, FetchError::Aborted)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Network(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid state: {0}")]
    InvalidState(&'static str),
    #[error("malformed attribute patch: expected an object, got {0}")]
    MalformedPatch(String),
    #[error("attaching this node would create a cycle")]
    Cycle,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub type Result<T, E = SdkError> = std::result::Result<T, E>;

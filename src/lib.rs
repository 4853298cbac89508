//! src/lib.rs
//!
//! Dashboard sdk core: a tree of nodes carrying inheritable attributes and
//! events, charts that fetch and poll time-series payloads, and the play
//! coordinator that decides which charts poll.
//!
//! Everything is single-threaded (`Rc`-based, `!Send`); fetches and timers are
//! local tasks, so charts are driven from inside a `tokio::task::LocalSet`.

pub mod api;
pub mod chart;
pub mod clock;
pub mod closest_row;
pub mod config;
pub mod error;
pub mod metadata;
pub mod node;
pub mod payload;
pub mod play;
pub mod pristine;
pub mod sdk;
pub mod timer;
pub mod units;

pub use api::{DataFetcher, HttpFetcher, SharedFetcher};
pub use chart::{Chart, ChartOptions, ChartUi, FetchHandle, KeyboardListener};
pub use clock::Clock;
pub use config::SdkConfig;
pub use error::{FetchError, Result, SdkError};
pub use metadata::{Metadata, MetadataDecorator, MetadataStore};
pub use node::{AttributeChange, Event, EventKind, Matcher, Node, NodeQuery, NodeType, Subscription};
pub use payload::{Payload, Row};
pub use play::{Play, WindowFocus};
pub use sdk::Sdk;

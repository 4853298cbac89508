#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use dashboard_sdk::{
    Chart, ChartUi, DataFetcher, Event, EventKind, FetchError, MetadataStore, Node, SdkConfig,
    SharedFetcher, Sdk,
};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

pub fn sdk(fetcher: impl DataFetcher + 'static) -> (Sdk, Rc<MetadataStore>) {
    let metadata = Rc::new(MetadataStore::new());
    let sdk = Sdk::new(
        SdkConfig::default(),
        Rc::new(fetcher) as SharedFetcher,
        metadata.clone(),
    );
    (sdk, metadata)
}

/// Raw agent payload with a `[time, a]` table.
pub fn payload(rows: Value) -> Value {
    json!({
        "dimension_ids": ["a"],
        "view_update_every": 1,
        "result": { "labels": ["time", "a"], "data": rows }
    })
}

/// Fetcher answering `payload` after `latency`, counting calls.
pub fn fetcher(
    latency: Duration,
    payload: Value,
) -> (impl DataFetcher + 'static, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let fetch = move |_: &Chart, _: CancellationToken| {
        counter.set(counter.get() + 1);
        let payload = payload.clone();
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            Ok::<_, FetchError>(payload)
        }
    };
    (fetch, calls)
}

pub fn failing() -> impl DataFetcher + 'static {
    |_: &Chart, _: CancellationToken| async { Err::<Value, _>(FetchError::Network("connection refused".into())) }
}

fn label(event: &Event) -> String {
    match event {
        Event::StartFetch => "startFetch".into(),
        Event::SuccessFetch { .. } => "successFetch".into(),
        Event::FailFetch(_) => "failFetch".into(),
        Event::FinishFetch => "finishFetch".into(),
        Event::Timeout(fired) => format!("timeout({fired})"),
        Event::MetadataChanged => "metadataChanged".into(),
        other => format!("{:?}", other.kind()),
    }
}

/// Record the fetch lifecycle events of `node` by name.
pub fn record(node: &Node) -> Rc<RefCell<Vec<String>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    for kind in [
        EventKind::StartFetch,
        EventKind::MetadataChanged,
        EventKind::SuccessFetch,
        EventKind::FailFetch,
        EventKind::FinishFetch,
        EventKind::Timeout,
    ] {
        let seen = seen.clone();
        let _ = node.on(kind, move |event| seen.borrow_mut().push(label(event)));
    }
    seen
}

pub fn count(seen: &Rc<RefCell<Vec<String>>>, name: &str) -> usize {
    seen.borrow().iter().filter(|label| *label == name).count()
}

#[derive(Default)]
pub struct CountingUi {
    pub renders: Cell<usize>,
    pub unmounts: Cell<usize>,
}

impl ChartUi for CountingUi {
    fn render(&self) {
        self.renders.set(self.renders.get() + 1);
    }

    fn unmount(&self) {
        self.unmounts.set(self.unmounts.get() + 1);
    }
}

pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

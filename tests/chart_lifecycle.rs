mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use common::{CountingUi, count, failing, fetcher, payload, record, sdk, sleep_ms};
use dashboard_sdk::chart::{GroupBySelection, NodeSelection};
use dashboard_sdk::{Chart, ChartUi, EventKind, FetchError, KeyboardListener, Metadata, SdkError};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::task::LocalSet;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn successful_fetch_updates_state_and_fires_in_order() {
    LocalSet::new()
        .run_until(async {
            let (fetch, calls) = fetcher(Duration::ZERO, payload(json!([[1, 1.0], [2, 2.0]])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk.make_chart(json!({ "after": -60 }), None).unwrap();
            let seen = record(&chart);

            chart.fetch().await;

            assert_eq!(
                *seen.borrow(),
                vec!["startFetch", "metadataChanged", "successFetch", "finishFetch"]
            );
            assert_eq!(calls.get(), 1);
            assert_eq!(chart.get_attribute("loaded"), Some(json!(true)));
            assert_eq!(chart.get_attribute("loading"), Some(json!(false)));
            assert!(chart.get_i64("updatedAt").unwrap() > 0);
            assert_eq!(chart.payload().rows().len(), 2);
            assert_eq!(chart.backoff_ms(), None);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn failures_back_off_exponentially_up_to_the_cap() {
    LocalSet::new()
        .run_until(async {
            let (sdk, _) = sdk(failing());
            let chart = sdk
                .make_chart(json!({ "after": -60, "updateEvery": 2, "active": true }), None)
                .unwrap();

            let backoffs = Rc::new(RefCell::new(Vec::new()));
            let (b, c) = (backoffs.clone(), chart.clone());
            let _sub = chart.on(EventKind::FailFetch, move |_| {
                b.borrow_mut().push(c.backoff_ms().unwrap())
            });

            chart.update_attribute("autofetch", true);
            sleep_ms(61_000).await;

            assert_eq!(
                *backoffs.borrow(),
                vec![2_000, 4_000, 8_000, 16_000, 30_000, 30_000]
            );
            assert_eq!(chart.get_attribute("loading"), Some(json!(false)));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn cancellation_is_silent() {
    LocalSet::new()
        .run_until(async {
            let (fetch, _) = fetcher(Duration::from_secs(10), payload(json!([])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk.make_chart(json!({ "after": -60 }), None).unwrap();
            let seen = record(&chart);

            let handle = chart.fetch();
            sleep_ms(100).await;
            assert_eq!(chart.get_attribute("loading"), Some(json!(true)));

            chart.cancel_fetch();
            handle.await;

            assert_eq!(*seen.borrow(), vec!["startFetch", "metadataChanged", "finishFetch"]);
            assert_eq!(chart.get_attribute("loading"), Some(json!(false)));
            assert_eq!(chart.get_attribute("loaded"), Some(json!(false)));
            assert_eq!(chart.backoff_ms(), Some(2_000));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn overdue_chart_catches_up_with_a_single_fetch() {
    LocalSet::new()
        .run_until(async {
            let (fetch, calls) = fetcher(Duration::ZERO, payload(json!([])));
            let (sdk, _) = sdk(fetch);
            let long_ago = sdk.clock().now_ms() - 5_000;
            let chart = sdk
                .make_chart(
                    json!({
                        "after": -60,
                        "updateEvery": 2,
                        "active": true,
                        "fetchStartedAt": long_ago
                    }),
                    None,
                )
                .unwrap();
            let seen = record(&chart);

            chart.update_attribute("autofetch", true);
            assert_eq!(count(&seen, "startFetch"), 1);

            sleep_ms(1_000).await;
            assert_eq!(calls.get(), 1);

            sleep_ms(1_500).await;
            assert_eq!(calls.get(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn polling_is_drift_corrected() {
    LocalSet::new()
        .run_until(async {
            let (fetch, _) = fetcher(Duration::from_millis(500), payload(json!([[1, 1.0]])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk
                .make_chart(json!({ "after": -60, "updateEvery": 2, "active": true }), None)
                .unwrap();

            let starts = Rc::new(RefCell::new(Vec::new()));
            let origin = sdk.clock().now_ms();
            let (s, clock) = (starts.clone(), sdk.clock());
            let _sub = chart.on(EventKind::StartFetch, move |_| {
                s.borrow_mut().push(clock.now_ms() - origin)
            });

            chart.update_attribute("autofetch", true);
            sleep_ms(5_000).await;

            assert_eq!(*starts.borrow(), vec![0, 2_000, 4_000]);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn deactivation_stops_polling() {
    LocalSet::new()
        .run_until(async {
            let (fetch, calls) = fetcher(Duration::ZERO, payload(json!([])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk
                .make_chart(json!({ "after": -60, "updateEvery": 1, "active": true }), None)
                .unwrap();

            chart.update_attribute("autofetch", true);
            sleep_ms(500).await;
            assert_eq!(calls.get(), 1);

            chart.deactivate();
            sleep_ms(10_000).await;
            assert_eq!(calls.get(), 1);

            chart.activate();
            sleep_ms(100).await;
            assert_eq!(calls.get(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn deactivation_mid_request_cancels_it_silently() {
    LocalSet::new()
        .run_until(async {
            let (fetch, calls) = fetcher(Duration::from_secs(1), payload(json!([[1, 1.0]])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk
                .make_chart(json!({ "after": -60, "updateEvery": 3, "active": true }), None)
                .unwrap();
            chart.fetch().await;
            assert_eq!(chart.get_attribute("loaded"), Some(json!(true)));
            assert_eq!(chart.backoff_ms(), None);
            let seen = record(&chart);

            let handle = chart.fetch();
            sleep_ms(100).await;
            assert_eq!(chart.get_attribute("loading"), Some(json!(true)));

            chart.deactivate();
            handle.await;

            assert_eq!(count(&seen, "failFetch"), 0);
            assert_eq!(count(&seen, "successFetch"), 0);
            assert_eq!(chart.get_attribute("loading"), Some(json!(false)));
            assert_eq!(chart.backoff_ms(), Some(3_000));

            sleep_ms(10_000).await;
            assert_eq!(calls.get(), 2);
            assert!(!chart.is_fetch_pending());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn deactivation_drops_a_queued_follow_up() {
    LocalSet::new()
        .run_until(async {
            let (fetch, calls) = fetcher(Duration::from_secs(1), payload(json!([[1, 1.0]])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk
                .make_chart(json!({ "after": -60, "active": true }), None)
                .unwrap();
            chart.fetch().await;
            let seen = record(&chart);

            let first = chart.fetch();
            sleep_ms(100).await;
            let queued = chart.fetch();
            chart.deactivate();
            futures::join!(first, queued);
            sleep_ms(5_000).await;

            assert_eq!(calls.get(), 2);
            assert_eq!(count(&seen, "startFetch"), 1);
            assert_eq!(chart.get_attribute("active"), Some(json!(false)));
            assert_eq!(chart.get_attribute("loading"), Some(json!(false)));
            assert!(!chart.is_fetch_pending());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn fetch_from_a_start_listener_joins_the_starting_fetch() {
    LocalSet::new()
        .run_until(async {
            let calls = Rc::new(Cell::new(0));
            let in_flight = Rc::new(Cell::new(0));
            let peak = Rc::new(Cell::new(0));
            let (c, f, p) = (calls.clone(), in_flight.clone(), peak.clone());
            let fetch = move |_: &Chart, _: CancellationToken| {
                c.set(c.get() + 1);
                let (in_flight, peak) = (f.clone(), p.clone());
                async move {
                    in_flight.set(in_flight.get() + 1);
                    peak.set(peak.get().max(in_flight.get()));
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    in_flight.set(in_flight.get() - 1);
                    Ok::<_, FetchError>(payload(json!([[1, 1.0]])))
                }
            };
            let (sdk, _) = sdk(fetch);
            let chart = sdk.make_chart(json!({ "after": -60 }), None).unwrap();
            let seen = record(&chart);

            let refetched = Rc::new(Cell::new(false));
            let (again, r) = (chart.clone(), refetched.clone());
            let _sub = chart.on(EventKind::StartFetch, move |_| {
                if !r.replace(true) {
                    let _ = again.fetch();
                }
            });

            chart.fetch().await;
            sleep_ms(2_000).await;

            assert!(refetched.get());
            assert_eq!(calls.get(), 1);
            assert_eq!(peak.get(), 1);
            assert_eq!(count(&seen, "startFetch"), 1);
            assert_eq!(count(&seen, "successFetch"), 1);
            assert_eq!(chart.get_attribute("loaded"), Some(json!(true)));
            assert!(!chart.is_fetch_pending());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn cancelling_from_a_start_listener_aborts_before_the_request() {
    LocalSet::new()
        .run_until(async {
            let (fetch, calls) = fetcher(Duration::from_secs(1), payload(json!([])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk.make_chart(json!({ "after": -60 }), None).unwrap();
            let seen = record(&chart);

            let c = chart.clone();
            let _sub = chart.on(EventKind::StartFetch, move |_| c.cancel_fetch());

            chart.fetch().await;

            assert_eq!(calls.get(), 0);
            assert_eq!(*seen.borrow(), vec!["startFetch", "finishFetch"]);
            assert_eq!(chart.get_attribute("loading"), Some(json!(false)));
            assert_eq!(chart.get_attribute("loaded"), Some(json!(false)));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn rendering_through_a_mounted_ui_fires_rendered() {
    LocalSet::new()
        .run_until(async {
            let (fetch, _) = fetcher(Duration::ZERO, payload(json!([])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk.make_chart(json!({ "after": -60 }), None).unwrap();

            let rendered = Rc::new(Cell::new(0));
            let r = rendered.clone();
            let _sub = chart.on(EventKind::Rendered, move |_| r.set(r.get() + 1));

            chart.render();
            assert_eq!(rendered.get(), 0);

            let ui = Rc::new(CountingUi::default());
            chart.set_ui(Some(ui.clone() as Rc<dyn ChartUi>));
            chart.render();
            chart.fetch_and_render().await;

            assert_eq!(ui.renders.get(), 2);
            assert_eq!(rendered.get(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn slow_request_times_out_then_recovers() {
    LocalSet::new()
        .run_until(async {
            let (fetch, _) = fetcher(Duration::from_secs(6), payload(json!([])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk.make_chart(json!({ "after": -60 }), None).unwrap();
            let seen = record(&chart);

            chart.fetch().await;

            assert_eq!(
                *seen.borrow(),
                vec![
                    "startFetch",
                    "metadataChanged",
                    "timeout(true)",
                    "successFetch",
                    "timeout(false)",
                    "finishFetch"
                ]
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn fetch_while_in_flight_supersedes_and_coalesces() {
    LocalSet::new()
        .run_until(async {
            let (fetch, calls) = fetcher(Duration::from_secs(1), payload(json!([[1, 1.0]])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk.make_chart(json!({ "after": -60 }), None).unwrap();
            let seen = record(&chart);

            let first = chart.fetch();
            sleep_ms(100).await;
            let second = chart.fetch();
            let third = chart.fetch();
            futures::join!(first, second, third);

            assert_eq!(calls.get(), 2);
            assert_eq!(count(&seen, "startFetch"), 2);
            assert_eq!(count(&seen, "successFetch"), 1);
            assert_eq!(count(&seen, "failFetch"), 0);
            assert_eq!(count(&seen, "finishFetch"), 2);
            assert!(!chart.is_fetch_pending());
            assert_eq!(chart.backoff_ms(), None);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn window_before_first_entry_skips_the_request() {
    LocalSet::new()
        .run_until(async {
            let (fetch, calls) = fetcher(Duration::ZERO, payload(json!([])));
            let (sdk, metadata) = sdk(fetch);
            metadata.insert(
                "system.cpu",
                Metadata {
                    first_entry: Some(4_000_000_000),
                    ..Metadata::default()
                },
            );
            let chart = sdk
                .make_chart(json!({ "after": -60, "context": "system.cpu" }), None)
                .unwrap();
            let seen = record(&chart);

            chart.fetch().await;

            assert_eq!(calls.get(), 0);
            assert!(seen.borrow().is_empty());
            assert_eq!(chart.get_attribute("loaded"), Some(json!(true)));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn payloads_merge_sticky_and_reset_the_closest_row_cache() {
    LocalSet::new()
        .run_until(async {
            let calls = Rc::new(Cell::new(0));
            let c = calls.clone();
            let fetch = move |_: &Chart, _: CancellationToken| {
                c.set(c.get() + 1);
                let raw = if c.get() == 1 {
                    json!({
                        "dimension_ids": ["a"],
                        "first_entry": 100,
                        "summary": { "nodes": 2 },
                        "result": { "labels": ["time", "a"], "data": [[1, 5.0], [2, 9.0], [3, 1.0]] }
                    })
                } else {
                    json!({
                        "dimension_ids": ["a"],
                        "result": { "labels": ["time", "a"], "data": [[10, 4.0]] }
                    })
                };
                async move { Ok::<_, FetchError>(raw) }
            };
            let (sdk, _) = sdk(fetch);
            let chart = sdk.make_chart(json!({ "after": -60 }), None).unwrap();

            chart.fetch().await;
            assert_eq!(chart.closest_row(2_100).map(|row| row.timestamp), Some(2_000));
            assert_eq!(chart.closest_row(2_600).map(|row| row.timestamp), Some(3_000));

            chart.fetch().await;
            let payload = chart.payload();
            assert_eq!(payload.first_entry, Some(100_000));
            assert_eq!(payload.extra.get("summary"), Some(&json!({ "nodes": 2 })));
            assert_eq!(chart.closest_row(2_100).map(|row| row.timestamp), Some(10_000));
        })
        .await;
}

#[derive(Default)]
struct PanickingKeyboard {
    attached: Cell<usize>,
}

impl KeyboardListener for PanickingKeyboard {
    fn attach(&self, _chart: &Chart) {
        self.attached.set(self.attached.get() + 1);
    }

    fn detach(&self) {
        panic!("keyboard already gone");
    }
}

#[tokio::test(start_paused = true)]
async fn destroy_tears_everything_down_once() {
    LocalSet::new()
        .run_until(async {
            let (fetch, _) = fetcher(Duration::from_secs(10), payload(json!([])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk.make_chart(json!({ "after": -60 }), None).unwrap();
            let seen = record(&chart);

            let unmounted = Rc::new(Cell::new(0));
            let u = unmounted.clone();
            let _sub = sdk.on(EventKind::UnmountChartUi, move |_| u.set(u.get() + 1));

            let ui = Rc::new(CountingUi::default());
            chart.set_ui(Some(ui.clone() as Rc<dyn ChartUi>));
            let keyboard = Rc::new(PanickingKeyboard::default());
            chart.set_keyboard_listener(Some(keyboard.clone() as Rc<dyn KeyboardListener>));
            chart.focus();
            assert_eq!(keyboard.attached.get(), 1);

            let handle = chart.fetch();
            sleep_ms(100).await;

            chart.destroy();
            chart.destroy();
            handle.await;

            assert!(chart.is_destroyed());
            assert_eq!(ui.unmounts.get(), 1);
            assert_eq!(unmounted.get(), 1);
            assert!(sdk.root().children().is_empty());
            assert_eq!(count(&seen, "failFetch"), 0);
            assert_eq!(chart.get_attribute("after"), None);
            assert!(chart.ui().is_none());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn resetting_pristine_restores_filters_and_notifies() {
    LocalSet::new()
        .run_until(async {
            let (fetch, calls) = fetcher(Duration::ZERO, payload(json!([])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk
                .make_chart(json!({ "after": -60, "aggregationMethod": "avg" }), None)
                .unwrap();

            let changes = Rc::new(RefCell::new(Vec::new()));
            let c = changes.clone();
            let _sub = chart.on_attribute_change("aggregationMethod", move |change| {
                c.borrow_mut().push((change.next.clone(), change.prev.clone()))
            });
            let pristine_events = Rc::new(Cell::new(0));
            let p = pristine_events.clone();
            let _sdk_sub = sdk.on(EventKind::PristineChanged, move |_| p.set(p.get() + 1));

            chart.update_aggregation_method("sum");
            sleep_ms(100).await;
            chart.update_aggregation_method("sum");
            assert_eq!(
                chart.get_own_attribute("pristine"),
                Some(json!({ "aggregationMethod": "avg" }))
            );

            chart.reset_pristine();

            assert_eq!(chart.get_attribute("aggregationMethod"), Some(json!("avg")));
            assert_eq!(chart.get_own_attribute("pristine"), Some(json!({})));
            assert_eq!(
                *changes.borrow(),
                vec![(json!("sum"), json!("avg")), (json!("avg"), json!("sum"))]
            );
            assert_eq!(pristine_events.get(), 1);

            sleep_ms(100).await;
            assert_eq!(calls.get(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn node_picker_splits_nodes_from_instances() {
    LocalSet::new()
        .run_until(async {
            let (fetch, calls) = fetcher(Duration::ZERO, payload(json!([])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk.make_chart(json!({ "after": -60 }), None).unwrap();

            let picked = [
                NodeSelection::Node("web-1".into()),
                NodeSelection::Instance("cpu0@db-1".into()),
                NodeSelection::Node("db-1".into()),
            ];
            chart.update_nodes(&picked);
            sleep_ms(100).await;
            assert_eq!(chart.get_attribute("selectedNodes"), Some(json!(["web-1", "db-1"])));
            assert_eq!(chart.get_attribute("selectedInstances"), Some(json!(["cpu0@db-1"])));
            assert_eq!(calls.get(), 1);

            chart.update_nodes(&picked);
            sleep_ms(100).await;
            assert_eq!(calls.get(), 1);

            chart.update_nodes(&[NodeSelection::Node("web-1".into())]);
            sleep_ms(100).await;
            assert_eq!(chart.get_attribute("selectedNodes"), Some(json!(["web-1"])));
            assert_eq!(chart.get_attribute("selectedInstances"), Some(json!([])));
            assert_eq!(calls.get(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn switching_context_scope_rederives_filters() {
    LocalSet::new()
        .run_until(async {
            let (fetch, calls) = fetcher(Duration::ZERO, payload(json!([])));
            let (sdk, metadata) = sdk(fetch);
            let mut described = Metadata::default();
            described.dimensions.insert("reads".into(), Default::default());
            metadata.insert("disk.io", described);

            let chart = sdk
                .make_chart(
                    json!({
                        "after": -60,
                        "context": "system.cpu",
                        "dimensions": ["reads", "user"]
                    }),
                    None,
                )
                .unwrap();

            chart.update_context_scope("disk.io");
            sleep_ms(100).await;

            assert_eq!(chart.get_attribute("contextScope"), Some(json!(["disk.io"])));
            assert_eq!(chart.get_attribute("dimensions"), Some(json!(["reads"])));
            assert_eq!(chart.get_attribute("aggregationMethod"), Some(json!("avg")));
            assert_eq!(chart.get_attribute("groupBy"), Some(json!(["dimension"])));
            assert_eq!(calls.get(), 1);

            chart.update_context_scope("disk.io");
            sleep_ms(100).await;
            assert_eq!(calls.get(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn group_by_picker_splits_labels_and_refetches_on_change() {
    LocalSet::new()
        .run_until(async {
            let (fetch, calls) = fetcher(Duration::ZERO, payload(json!([])));
            let (sdk, _) = sdk(fetch);
            let chart = sdk.make_chart(json!({ "after": -60 }), None).unwrap();

            let picked = [
                GroupBySelection::Node,
                GroupBySelection::Label("mount".into()),
            ];
            chart.update_group_by(&picked);
            sleep_ms(100).await;
            assert_eq!(chart.get_attribute("groupBy"), Some(json!(["node", "label"])));
            assert_eq!(chart.get_attribute("groupByLabel"), Some(json!(["mount"])));
            assert_eq!(calls.get(), 1);

            chart.update_group_by(&picked);
            sleep_ms(100).await;
            assert_eq!(calls.get(), 1);

            chart.update_group_by(&[]);
            sleep_ms(100).await;
            assert_eq!(chart.get_attribute("groupBy"), Some(json!(["dimension"])));
            assert_eq!(chart.get_attribute("groupByLabel"), Some(json!([])));
            assert_eq!(calls.get(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn composite_charts_derive_filters_from_new_metadata() {
    LocalSet::new()
        .run_until(async {
            let (fetch, _) = fetcher(Duration::ZERO, payload(json!([])));
            let (sdk, metadata) = sdk(fetch);
            let mut described = Metadata::default();
            for id in ["a", "b"] {
                described.dimensions.insert(id.into(), Default::default());
            }
            metadata.insert("disk.io", described);

            let chart = sdk
                .make_chart(
                    json!({
                        "after": -60,
                        "context": "disk.io",
                        "composite": true,
                        "dimensions": ["a", "gone"]
                    }),
                    None,
                )
                .unwrap();

            chart.fetch().await;

            assert_eq!(chart.get_attribute("dimensions"), Some(json!(["a"])));
            assert_eq!(chart.get_attribute("aggregationMethod"), Some(json!("avg")));
            assert_eq!(chart.get_attribute("groupBy"), Some(json!(["dimension"])));
            assert_eq!(chart.pristine().key(), "pristineComposite");

            chart.toggle_dimension("b");
            assert_eq!(chart.get_attribute("dimensions"), Some(json!([])));
            assert_eq!(
                chart.get_own_attribute("pristineComposite"),
                Some(json!({ "dimensions": ["a"] }))
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn units_conversion_is_stored_on_the_chart() {
    LocalSet::new()
        .run_until(async {
            let (fetch, _) = fetcher(Duration::ZERO, payload(json!([])));
            let (sdk, metadata) = sdk(fetch);
            metadata.insert(
                "net.io",
                Metadata {
                    units: "bytes".into(),
                    ..Metadata::default()
                },
            );
            let chart = sdk.make_chart(json!({ "context": "net.io" }), None).unwrap();

            let conversion = chart.update_units_conversion(0.0, 1_500_000.0);

            assert_eq!(conversion.unit, "MB");
            assert_eq!(chart.get_attribute("unitsCurrent"), Some(json!("MB")));
            assert_eq!(chart.get_attribute("unitsConversionFractionDigits"), Some(json!(2)));
            assert_eq!(chart.converted_value(1_234_567.0), "1.23");
        })
        .await;
}

#[test]
fn non_object_attributes_are_rejected() {
    let (sdk, _) = sdk(failing());
    assert!(matches!(
        sdk.make_chart(json!([1, 2]), None),
        Err(SdkError::MalformedPatch(_))
    ));
}

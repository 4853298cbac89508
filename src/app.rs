//! src/app.rs
//!
//! Terminal dashboard driving the sdk against a simulated agent.
//!
//! # Overview
//! Three charts (cpu, network, ram) live in one container that syncs hover and
//! panning, so hovering one chart pauses all three and panning moves all three
//! windows. The ram chart is composite and opts out of background polling.
//! The play coordinator decides which charts poll; this module only turns key
//! presses into chart operations and draws a frame every `frame_ms`.
//!
//! # Keyboard Controls
//! See [`BINDINGS`]; they are also listed in the Controls panel.
//!
//! # Runtime
//! Charts are `!Send`, so everything runs on a current-thread tokio runtime
//! inside a `LocalSet`. The frame loop yields with `tokio::time::sleep`
//! between frames, which is when fetch tasks and timers make progress.

use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEventKind};
use dashboard_sdk::{Chart, ChartUi, Clock, MetadataStore, Play, Sdk, SharedFetcher, WindowFocus};
use ratatui::DefaultTerminal;
use ratatui::layout::Constraint;
use serde_json::{Value, json};
use tokio::task::LocalSet;
use tokio::time::Instant;
use tracing::info;

use crate::panels::{GraphPanel, InfoPanel, KeysPanel, StatusPanel, TooltipPanel};
use crate::settings::Settings;
use crate::simulate::SimulatedAgent;
use crate::ui::{Pane, TerminalUi, columns, even, panel, rows};

pub const BINDINGS: &[(&str, &str)] = &[
    ("Tab", "focus next chart"),
    ("h", "hover focused chart"),
    ("p", "activate / deactivate chart"),
    ("g", "cycle aggregation"),
    ("d", "toggle next dimension"),
    ("r", "reset filters"),
    ("Left", "pan back"),
    ("Right", "pan forward"),
    ("l", "back to live"),
    ("[ ]", "move tooltip cursor"),
    ("b", "blur / focus window"),
    ("q", "quit"),
];

const AGGREGATIONS: [&str; 4] = ["avg", "sum", "min", "max"];
const LIVE_AFTER: i64 = -120;
const PAN_STEP_SECS: i64 = 30;
const CURSOR_STEP_SECS: i64 = 5;

struct Dashboard {
    sdk: Sdk,
    play: Play,
    charts: Vec<(Chart, Rc<TerminalUi>)>,
    focused: usize,
    hovering: bool,
    /// Next dimension `d` toggles.
    dimension_cursor: usize,
    /// Tooltip cursor, seconds before the end of the window.
    cursor_back: i64,
    running: bool,
}

impl Dashboard {
    fn new(settings: &Settings) -> color_eyre::Result<Self> {
        let clock = Clock::system();
        let agent = SimulatedAgent::new(clock, settings.latency(), settings.failure_rate);
        let metadata = Rc::new(MetadataStore::new());
        agent.describe(&metadata);

        let sdk = Sdk::with_clock(
            settings.sdk.clone(),
            Rc::new(agent) as SharedFetcher,
            metadata,
            clock,
        );
        let play = Play::start(&sdk, WindowFocus::default());

        let group = sdk.make_container(
            json!({
                "syncHover": true,
                "syncPanning": true,
                "after": LIVE_AFTER,
                "points": 120,
            }),
            None,
        )?;
        let layouts = [
            json!({ "context": "system.cpu" }),
            json!({ "context": "system.net" }),
            json!({ "context": "system.ram", "composite": true, "autofetchOnWindowBlur": false }),
        ];

        let mut charts = Vec::with_capacity(layouts.len());
        for attributes in layouts {
            let chart = sdk.make_chart(attributes, Some(&group))?;
            let ui = Rc::new(TerminalUi::new());
            chart.set_ui(Some(ui.clone() as Rc<dyn ChartUi>));
            chart.activate();
            charts.push((chart, ui));
        }
        charts[0].0.focus();
        info!(charts = charts.len(), "dashboard ready");

        Ok(Self {
            sdk,
            play,
            charts,
            focused: 0,
            hovering: false,
            dimension_cursor: 0,
            cursor_back: 0,
            running: true,
        })
    }

    fn chart(&self) -> &Chart {
        &self.charts[self.focused].0
    }

    fn layout(&self) -> Pane {
        let regions: Vec<Pane> = self
            .charts
            .iter()
            .enumerate()
            .map(|(index, (chart, ui))| {
                let highlighted = index == self.focused;
                rows(
                    vec![Constraint::Percentage(75), Constraint::Percentage(25)],
                    vec![
                        panel(GraphPanel::new(chart.clone(), highlighted)),
                        panel(InfoPanel::new(chart.clone(), ui.clone(), highlighted)),
                    ],
                )
            })
            .collect();

        let cursor = self.chart().date_window().1 - self.cursor_back * 1000;
        rows(
            vec![Constraint::Length(3), Constraint::Min(0)],
            vec![
                panel(StatusPanel::new(&self.sdk, &self.play)),
                columns(
                    vec![Constraint::Percentage(70), Constraint::Percentage(30)],
                    vec![
                        rows(even(regions.len()), regions),
                        rows(
                            vec![Constraint::Percentage(60), Constraint::Percentage(40)],
                            vec![
                                panel(TooltipPanel::new(self.chart().clone(), cursor)),
                                panel(KeysPanel::new(BINDINGS)),
                            ],
                        ),
                    ],
                ),
            ],
        )
    }

    async fn run(&mut self, terminal: &mut DefaultTerminal, frame: Duration) -> color_eyre::Result<()> {
        while self.running {
            let frame_start = Instant::now();
            let root = self.layout();
            terminal.draw(|f| root.draw(f, f.area()))?;

            while event::poll(Duration::ZERO)? {
                if let TermEvent::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.on_key(key.code);
                    }
                }
            }

            tokio::time::sleep(frame.saturating_sub(frame_start.elapsed())).await;
        }
        Ok(())
    }

    fn on_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Tab => self.cycle_focus(),
            KeyCode::Char('h') => {
                self.hovering = !self.hovering;
                if self.hovering {
                    self.chart().hover();
                } else {
                    self.chart().unhover();
                }
            }
            KeyCode::Char('p') => {
                let chart = self.chart();
                if chart.get_bool("active") {
                    chart.deactivate();
                } else {
                    chart.activate();
                }
            }
            KeyCode::Char('g') => {
                let chart = self.chart();
                let current = chart
                    .get_str("aggregationMethod")
                    .unwrap_or_else(|| "avg".to_string());
                let next = AGGREGATIONS
                    .iter()
                    .position(|method| *method == current)
                    .map_or(0, |index| (index + 1) % AGGREGATIONS.len());
                chart.update_aggregation_method(AGGREGATIONS[next]);
            }
            KeyCode::Char('d') => self.toggle_dimension(),
            KeyCode::Char('r') => self.chart().reset_pristine(),
            KeyCode::Left => self.pan(-PAN_STEP_SECS),
            KeyCode::Right => self.pan(PAN_STEP_SECS),
            KeyCode::Char('l') => self.chart().move_x(LIVE_AFTER, 0),
            KeyCode::Char('[') => self.cursor_back += CURSOR_STEP_SECS,
            KeyCode::Char(']') => self.cursor_back = (self.cursor_back - CURSOR_STEP_SECS).max(0),
            KeyCode::Char('b') => {
                if self.play.focus_state().is_focused() {
                    self.play.blur();
                } else {
                    self.play.focus();
                }
            }
            _ => {}
        }
    }

    fn cycle_focus(&mut self) {
        if self.hovering {
            self.chart().unhover();
            self.hovering = false;
        }
        self.chart().blur();
        self.focused = (self.focused + 1) % self.charts.len();
        self.chart().focus();
    }

    fn toggle_dimension(&mut self) {
        let chart = self.chart().clone();
        let ids: Vec<String> = chart.metadata().dimensions.keys().cloned().collect();
        if ids.is_empty() {
            return;
        }
        let id = ids[self.dimension_cursor % ids.len()].clone();
        self.dimension_cursor += 1;

        if chart.get_bool("composite") {
            chart.toggle_dimension(&id);
            return;
        }
        let mut selected: Vec<String> = chart
            .get_attribute("selectedDimensions")
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();
        if let Some(at) = selected.iter().position(|item| *item == id) {
            selected.remove(at);
        } else {
            selected.push(id);
        }
        chart.update_selected_dimensions(&selected);
    }

    /// Shift the synced window; panning past now returns to live.
    fn pan(&self, step: i64) {
        let chart = self.chart();
        let (after, before) = chart.date_window();
        let (after, before) = (after / 1000 + step, before / 1000 + step);
        let now = self.sdk.clock().now_ms() / 1000;
        if before >= now {
            chart.move_x(LIVE_AFTER, 0);
        } else {
            chart.move_x(after, before);
        }
    }

    fn shutdown(self) {
        let polled: Vec<Value> = self
            .charts
            .iter()
            .map(|(chart, ui)| json!({ "chart": chart.id().to_string(), "renders": ui.renders() }))
            .collect();
        let polled = Value::Array(polled);
        info!(charts = %polled, "shutting down");
        self.play.stop();
        self.sdk.destroy();
    }
}

pub fn run(settings: Settings) -> color_eyre::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let local = LocalSet::new();
    local.block_on(&runtime, async {
        let mut dashboard = Dashboard::new(&settings)?;
        let mut terminal = ratatui::init();
        let result = dashboard.run(&mut terminal, settings.frame()).await;
        ratatui::restore();
        dashboard.shutdown();
        result
    })
}

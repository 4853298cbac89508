//! src/panels/info.rs
//!
//! Chart info panel: polling state, filters and pristine status.

use std::rc::Rc;

use dashboard_sdk::Chart;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use serde_json::Value;

use crate::ui::TerminalUi;

pub struct InfoPanel {
    pub chart: Chart,
    pub ui: Rc<TerminalUi>,
    pub highlighted: bool,
}

impl InfoPanel {
    pub fn new(chart: Chart, ui: Rc<TerminalUi>, highlighted: bool) -> Self {
        Self {
            chart,
            ui,
            highlighted,
        }
    }

    fn list(&self, key: &str) -> String {
        match self.chart.get_attribute(key) {
            Some(Value::Array(items)) if !items.is_empty() => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(","),
            _ => "all".to_string(),
        }
    }
}

impl crate::ui::Panel for InfoPanel {
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let chart = &self.chart;
        let flag = |key: &str| {
            if chart.get_bool(key) {
                Span::styled(key.to_string(), Style::default().fg(Color::Green))
            } else {
                Span::styled(key.to_string(), Style::default().fg(Color::DarkGray))
            }
        };

        let backoff = chart
            .backoff_ms()
            .map_or_else(|| "-".to_string(), |ms| format!("{ms}ms"));
        let dimensions = if chart.get_bool("composite") {
            self.list("dimensions")
        } else {
            self.list("selectedDimensions")
        };
        let pristine = chart.pristine();
        let pristine = if pristine.is_pristine(&chart.get_own_attributes()) {
            "pristine"
        } else {
            "modified"
        };

        let lines = vec![
            Line::from(vec![
                flag("active"),
                Span::raw(" "),
                flag("autofetch"),
                Span::raw(" "),
                flag("loaded"),
                Span::raw(" "),
                flag("hovering"),
                Span::raw(" "),
                flag("paused"),
            ]),
            Line::from(format!(
                "every={}ms  backoff={backoff}  renders={}{}",
                chart.update_every_ms(),
                self.ui.renders(),
                if self.ui.is_mounted() { "" } else { " (unmounted)" },
            )),
            Line::from(format!(
                "aggregation={}  dimensions={dimensions}  {pristine}",
                chart
                    .get_str("aggregationMethod")
                    .unwrap_or_else(|| "avg".to_string()),
            )),
        ];

        let mut block = Block::default().title("Info").borders(Borders::ALL);
        if self.highlighted {
            block = block.style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        }
        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}

//! src/panels/graph.rs
//!
//! Graph panel: the chart's payload as one line per dimension, with a stats row
//! in converted units.
//!
//! Drawing also refreshes the chart's units conversion for the visible bounds,
//! so every other panel formats values the same way.

use dashboard_sdk::Chart;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart as LineChart, Dataset, GraphType, Paragraph},
};

const PALETTE: [Color; 6] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::Blue,
    Color::Red,
];

pub struct GraphPanel {
    pub chart: Chart,
    pub highlighted: bool,
}

impl GraphPanel {
    pub fn new(chart: Chart, highlighted: bool) -> Self {
        Self { chart, highlighted }
    }

    /// Visible `(min, max)` with padding so flat series still show a line.
    fn padded_bounds(bounds: Option<(f64, f64)>) -> (f64, f64) {
        let Some((mn, mx)) = bounds else {
            return (0.0, 1.0);
        };
        if (mx - mn).abs() < f64::EPSILON {
            let pad = mn.abs().max(1.0) * 0.1;
            (mn - pad, mx + pad)
        } else {
            let pad = (mx - mn) * 0.1;
            (mn - pad, mx + pad)
        }
    }

    fn title(&self) -> String {
        let metadata = self.chart.metadata();
        let name = if metadata.title.is_empty() {
            self.chart.get_str("context").unwrap_or_default()
        } else {
            metadata.title.clone()
        };
        let units = self.chart.get_str("unitsCurrent").unwrap_or_default();
        let state = if self.chart.get_bool("loading") {
            " (loading)"
        } else if !self.chart.get_bool("autofetch") {
            " (stopped)"
        } else {
            ""
        };
        format!("{name} [{units}]{state}")
    }
}

impl crate::ui::Panel for GraphPanel {
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let payload = self.chart.payload();
        let bounds = payload.bounds();
        if let Some((mn, mx)) = bounds {
            self.chart.update_units_conversion(mn, mx);
        }

        let stats_text = match (bounds, payload.rows().last()) {
            (Some((mn, mx)), Some(last)) => {
                let last = last.values.iter().flatten().next().copied().unwrap_or(f64::NAN);
                format!(
                    "Min: {}  Max: {}  Last: {}",
                    self.chart.converted_value(mn),
                    self.chart.converted_value(mx),
                    self.chart.converted_value(last),
                )
            }
            _ => "no data".to_string(),
        };
        let stats = Paragraph::new(stats_text)
            .block(Block::default().title("Stats").borders(Borders::ALL));
        f.render_widget(stats, chunks[0]);

        // Keep series alive until the chart widget is rendered.
        let series: Vec<Vec<(f64, f64)>> = (0..payload.dimension_ids.len())
            .map(|index| {
                payload
                    .rows()
                    .iter()
                    .filter_map(|row| {
                        let value = row.values.get(index).copied().flatten()?;
                        Some((row.timestamp as f64 / 1000.0, value))
                    })
                    .collect()
            })
            .collect();

        let datasets: Vec<Dataset> = payload
            .dimension_ids
            .iter()
            .zip(series.iter())
            .enumerate()
            .map(|(index, (id, points))| {
                Dataset::default()
                    .name(id.clone())
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(PALETTE[index % PALETTE.len()]))
                    .data(points.as_slice())
            })
            .collect();

        let (after, before) = self.chart.date_window();
        let (ymin, ymax) = Self::padded_bounds(bounds);
        let y_labels: Vec<String> = (0..5)
            .map(|i| self.chart.converted_value(ymin + (ymax - ymin) * i as f64 / 4.0))
            .collect();

        let mut block = Block::default().title(self.title()).borders(Borders::ALL);
        if self.highlighted {
            block = block.border_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        }
        let widget = LineChart::new(datasets)
            .block(block)
            .x_axis(Axis::default().bounds([after as f64 / 1000.0, before as f64 / 1000.0]))
            .y_axis(Axis::default().bounds([ymin, ymax]).labels(y_labels));
        f.render_widget(widget, chunks[1]);
    }
}

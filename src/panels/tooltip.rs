//! src/panels/tooltip.rs
//!
//! Tooltip panel: the row closest to the cursor and its neighbours, the way a
//! hover tooltip resolves them.

use dashboard_sdk::{Chart, Row};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub struct TooltipPanel {
    pub chart: Chart,
    /// Cursor position, epoch milliseconds.
    pub cursor: i64,
}

impl TooltipPanel {
    pub fn new(chart: Chart, cursor: i64) -> Self {
        Self { chart, cursor }
    }

    fn line(&self, labels: &[String], row: &Row, closest: bool) -> Line<'static> {
        let time_style = if closest {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Green)
        };
        let mut spans = vec![Span::styled(format!("{:>10}", row.timestamp / 1000), time_style)];
        for (label, value) in labels.iter().zip(row.values.iter().copied()) {
            spans.push(Span::styled(format!("  {label}: "), Style::default().fg(Color::Yellow)));
            let text = value.map_or_else(|| "-".to_string(), |v| self.chart.converted_value(v));
            spans.push(Span::styled(text, Style::default().fg(Color::Cyan)));
        }
        Line::from(spans)
    }
}

impl crate::ui::Panel for TooltipPanel {
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let block = Block::default().title("Tooltip").borders(Borders::ALL);
        let Some(closest) = self.chart.closest_row(self.cursor) else {
            f.render_widget(Paragraph::new("no data").block(block), area);
            return;
        };

        let payload = self.chart.payload();
        let rows = payload.rows();
        let at = rows
            .iter()
            .position(|row| row.timestamp == closest.timestamp)
            .unwrap_or_default();
        let half = (area.height.saturating_sub(2) / 2) as usize;
        let start = at.saturating_sub(half);
        let end = (at + half + 1).min(rows.len());

        let lines: Vec<Line> = rows[start..end]
            .iter()
            .enumerate()
            .map(|(offset, row)| self.line(&payload.dimension_ids, row, start + offset == at))
            .collect();
        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}

//! src/panels/status.rs
//!
//! Header line: window focus, render loop and chart counts.

use dashboard_sdk::{Play, Sdk};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

pub struct StatusPanel {
    pub text: String,
    pub live: bool,
}

impl StatusPanel {
    pub fn new(sdk: &Sdk, play: &Play) -> Self {
        let charts: Vec<_> = sdk.charts().collect();
        let polling = charts
            .iter()
            .filter(|chart| chart.get_bool("autofetch"))
            .count();
        let focus = if play.focus_state().is_focused() {
            "focused"
        } else {
            "blurred"
        };
        let rendering = if play.is_rendering() { "on" } else { "off" };
        Self {
            text: format!(
                "Dashboard  window={focus}  render loop={rendering}  polling {polling}/{} charts",
                charts.len()
            ),
            live: polling > 0,
        }
    }
}

impl crate::ui::Panel for StatusPanel {
    fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        let color = if self.live { Color::Green } else { Color::DarkGray };
        let p = Paragraph::new(self.text.clone())
            .style(Style::default().fg(color))
            .block(Block::default().title("Status").borders(Borders::ALL));
        f.render_widget(p, area);
    }
}

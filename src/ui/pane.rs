//! src/ui/pane.rs
//!
//! Layout tree rebuilt every frame: splits down to boxed panels.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Anything drawable into a rectangle of the frame.
pub trait Panel {
    fn draw(&self, f: &mut Frame<'_>, area: Rect);
}

pub enum Pane {
    Split {
        direction: Direction,
        constraints: Vec<Constraint>,
        children: Vec<Pane>,
    },
    Panel(Box<dyn Panel>),
}

impl Pane {
    pub fn draw(&self, f: &mut Frame<'_>, area: Rect) {
        match self {
            Pane::Split {
                direction,
                constraints,
                children,
            } => {
                let chunks = Layout::default()
                    .direction(*direction)
                    .constraints(constraints.iter().copied())
                    .split(area);
                for (child, chunk) in children.iter().zip(chunks.iter()) {
                    child.draw(f, *chunk);
                }
            }
            Pane::Panel(panel) => panel.draw(f, area),
        }
    }
}

/// Children stacked top to bottom.
pub fn rows(constraints: Vec<Constraint>, children: Vec<Pane>) -> Pane {
    Pane::Split {
        direction: Direction::Vertical,
        constraints,
        children,
    }
}

/// Children side by side.
pub fn columns(constraints: Vec<Constraint>, children: Vec<Pane>) -> Pane {
    Pane::Split {
        direction: Direction::Horizontal,
        constraints,
        children,
    }
}

pub fn panel(panel: impl Panel + 'static) -> Pane {
    Pane::Panel(Box::new(panel))
}

/// `count` equal shares of the available space.
pub fn even(count: usize) -> Vec<Constraint> {
    (0..count)
        .map(|_| Constraint::Ratio(1, count.max(1) as u32))
        .collect()
}

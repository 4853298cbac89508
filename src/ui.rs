//! src/ui.rs
//!
//! Terminal side of the dashboard: the layout tree and the chart ui adapter.

pub mod adapter;
pub mod pane;

pub use adapter::TerminalUi;
pub use pane::{Panel, Pane, columns, even, panel, rows};

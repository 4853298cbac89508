//! src/panels.rs
//!
//! Panels drawn by the dashboard, one per concern.

pub mod graph;
pub mod info;
pub mod keys;
pub mod status;
pub mod tooltip;

pub use graph::GraphPanel;
pub use info::InfoPanel;
pub use keys::KeysPanel;
pub use status::StatusPanel;
pub use tooltip::TooltipPanel;

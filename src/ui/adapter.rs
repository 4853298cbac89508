//! src/ui/adapter.rs
//!
//! `ChartUi` implementation for the terminal: the frame loop redraws
//! everything, so a render request only marks the chart as touched.

use std::cell::Cell;

use dashboard_sdk::ChartUi;
use tracing::debug;

#[derive(Debug)]
pub struct TerminalUi {
    renders: Cell<u64>,
    mounted: Cell<bool>,
}

impl TerminalUi {
    pub fn new() -> Self {
        Self {
            renders: Cell::new(0),
            mounted: Cell::new(true),
        }
    }

    pub fn renders(&self) -> u64 {
        self.renders.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }
}

impl ChartUi for TerminalUi {
    fn render(&self) {
        self.renders.set(self.renders.get() + 1);
    }

    fn unmount(&self) {
        debug!(renders = self.renders.get(), "chart ui unmounted");
        self.mounted.set(false);
    }
}

impl Default for TerminalUi {
    fn default() -> Self {
        Self::new()
    }
}

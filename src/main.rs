//! src/main.rs
//!
//! Entrypoint: settings, logging, then `app::run()`.

mod app;
mod panels;
mod settings;
mod simulate;
mod ui;

use std::fs::File;
use std::sync::Mutex;

use color_eyre::eyre::eyre;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Log to a file; the terminal belongs to the ui.
fn init_logs(path: &str) -> color_eyre::Result<()> {
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|err| eyre!("failed to install tracing subscriber: {err}"))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let settings = settings::Settings::load()?;
    init_logs(&settings.log_file)?;
    app::run(settings)
}

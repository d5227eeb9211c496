//! polyrhythm - rotating polygon instrument in the terminal
//!
//! Run with: cargo run --bin polyrhythm
//!
//! Reads `polyrhythm.toml` from the working directory when present. Logs go
//! to `polyrhythm.log`; set `POLYRHYTHM_LOG` (e.g. `polyrhythm=debug`) to
//! change the filter.

mod app;
mod ui;

use std::{path::Path, sync::Mutex};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use polyrhythm::Config;
use tracing_subscriber::EnvFilter;

use app::App;

const CONFIG_FILE: &str = "polyrhythm.toml";
const LOG_FILE: &str = "polyrhythm.log";

fn init_logging() -> EyreResult<()> {
    let file = std::fs::File::create(LOG_FILE).wrap_err("failed to create log file")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("POLYRHYTHM_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_config() -> EyreResult<Config> {
    let path = Path::new(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    let config = Config::load(path).wrap_err_with(|| format!("failed to load {CONFIG_FILE}"))?;
    tracing::info!(path = CONFIG_FILE, "config loaded");
    Ok(config)
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_logging()?;

    let config = load_config()?;
    App::new(config).run()
}

mod app;
mod config;
mod fixtures;
mod logging;
mod persistence;

use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_FILENAME));
    app::run(&config_path)
}

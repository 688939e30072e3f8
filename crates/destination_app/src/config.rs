use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use destination_core::StoreSettings;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use store_logging::store_warn;

use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_FILENAME: &str = "destination_store.ron";

/// Binary configuration, read from RON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreSettings,
    pub kiosk_mode: bool,
    /// Empty when the platform has no default printer.
    pub system_default_id: String,
    /// Serialized default destination selection rules.
    pub selection_rules: Option<String>,
    pub active_user: String,
    pub fixtures_path: PathBuf,
    pub state_dir: PathBuf,
    /// How long to wait for the selection to settle before reporting.
    pub settle_timeout_ms: u64,
    pub log_destination: LogDestination,
    pub log_level: String,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            kiosk_mode: false,
            system_default_id: String::new(),
            selection_rules: None,
            active_user: String::new(),
            fixtures_path: PathBuf::from("printers.ron"),
            state_dir: PathBuf::from(".destination_state"),
            settle_timeout_ms: 20_000,
            log_destination: LogDestination::Terminal,
            log_level: "info".to_string(),
            log_file: PathBuf::from("destination_store.log"),
        }
    }
}

impl AppConfig {
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    /// Relative paths in the config resolve against the config's directory.
    fn resolve_paths(mut self, base: &Path) -> Self {
        for path in [&mut self.fixtures_path, &mut self.state_dir, &mut self.log_file] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}

/// Loads the config, falling back to defaults when the file is missing or
/// malformed. Logging is not up yet, so failures go to the returned warning.
pub fn load_config(path: &Path) -> (AppConfig, Option<String>) {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return (AppConfig::default().resolve_paths(base), None);
        }
        Err(err) => {
            let warning = format!("Failed to read config from {:?}: {}", path, err);
            return (AppConfig::default().resolve_paths(base), Some(warning));
        }
    };

    match ron::from_str::<AppConfig>(&content) {
        Ok(config) => (config.resolve_paths(base), None),
        Err(err) => {
            let warning = format!("Failed to parse config from {:?}: {}", path, err);
            (AppConfig::default().resolve_paths(base), Some(warning))
        }
    }
}

/// Logs a warning produced by [`load_config`] once logging is initialized.
pub fn report_warning(warning: Option<String>) {
    if let Some(warning) = warning {
        store_warn!("{}; using defaults", warning);
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Origin;

/// Delay before the store gives up on the auto-select target.
pub const AUTO_SELECT_TIMEOUT_MS: u64 = 15_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Prefer the system default printer over the most recent destination.
    pub use_system_default_as_default: bool,
    /// Cloud printers are listed through the discovery source instead of the
    /// cloud directory search.
    pub cloud_printer_handler_enabled: bool,
    /// `Cros` on Chrome OS, `Local` elsewhere.
    pub platform_origin: Origin,
    pub auto_select_timeout_ms: u64,
    pub pdf_display_name: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            use_system_default_as_default: false,
            cloud_printer_handler_enabled: false,
            platform_origin: Origin::Local,
            auto_select_timeout_ms: AUTO_SELECT_TIMEOUT_MS,
            pdf_display_name: "Save as PDF".to_string(),
        }
    }
}

impl StoreSettings {
    pub fn auto_select_timeout(&self) -> Duration {
        Duration::from_millis(self.auto_select_timeout_ms)
    }

    /// Origin of system printers; anything but `Cros` means `Local`.
    pub fn platform_origin(&self) -> Origin {
        match self.platform_origin {
            Origin::Cros => Origin::Cros,
            _ => Origin::Local,
        }
    }
}

//! Bridge configuration
//!
//! Stored as TOML at `~/.config/extkbd/config.toml`. A missing file means
//! defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vendors::VendorAllowList;

/// Complete bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Name of the message channel the application talks to
    #[serde(default = "default_channel_name")]
    pub channel_name: String,
    /// Vendor IDs treated as keyboards in addition to the built-in list
    #[serde(default)]
    pub extra_vendor_ids: Vec<u16>,
    /// Default log filter (overridden by `RUST_LOG` and `--log-level`)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Capacity of the notification broadcast channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_channel_name() -> String {
    "extkbd/external_keyboard".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_capacity() -> usize {
    64
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel_name: default_channel_name(),
            extra_vendor_ids: Vec::new(),
            log_level: default_log_level(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl BridgeConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("extkbd")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: BridgeConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Vendor allow-list including the configured extras
    pub fn vendors(&self) -> VendorAllowList {
        VendorAllowList::with_extra(&self.extra_vendor_ids)
    }
}

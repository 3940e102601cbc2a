//! Configuration file
//!
//! TOML, loaded from `~/.config/zmk-slider/config.toml` unless a path is given.
//! A missing file yields the defaults; every section and key is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use zmk_session::SessionConfig;
use zmk_transport::{protocol, DeviceFilter, DEFAULT_POLL_INTERVAL};

/// Which interfaces are offered for selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// HID usage page of the vendor interface
    pub usage_page: u16,
    /// Optional vendor ID restriction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<u16>,
    /// Optional product ID restriction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u16>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            usage_page: protocol::USAGE_PAGE,
            vendor_id: None,
            product_id: None,
        }
    }
}

impl FilterConfig {
    pub fn to_filter(&self) -> DeviceFilter {
        DeviceFilter {
            usage_page: self.usage_page,
            vendor_id: self.vendor_id,
            product_id: self.product_id,
        }
    }
}

/// Report protocol settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Output report ID for value reports
    pub report_id: u8,
    /// Value sent after binding to request the current state
    pub read_probe: u8,
    /// Whether input reports start with a report ID byte
    pub numbered_reports: bool,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            report_id: protocol::report::VALUE,
            read_probe: protocol::READ_PROBE,
            numbered_reports: true,
        }
    }
}

/// Hot-plug monitoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotplugConfig {
    pub enabled: bool,
    /// Re-enumeration interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for HotplugConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
        }
    }
}

impl HotplugConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(50))
    }
}

/// Slider behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Arrow-key increment
    pub step: u8,
    /// Send on every slider move instead of only on save
    pub live: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { step: 1, live: false }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub filter: FilterConfig,
    pub protocol: ProtocolConfig,
    pub hotplug: HotplugConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zmk-slider")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Session settings derived from this config
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            filter: self.filter.to_filter(),
            report_id: self.protocol.report_id,
            read_probe: self.protocol.read_probe,
        }
    }
}

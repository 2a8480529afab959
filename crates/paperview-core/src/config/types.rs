//! Configuration type definitions.
//!
//! These types are deserialized from TOML config files. Every field has a
//! default, so an empty file (or no file at all) yields a working setup for a
//! Waveshare 7.5" V2 panel on a Raspberry Pi.
//!
//! # Example Configuration
//!
//! ```toml
//! [schedule]
//! quick_interval_secs = 15
//! full_interval_secs = 1800
//!
//! [content]
//! host = "dashboard.local"
//! path = "screen"
//! second_view = false
//!
//! [display]
//! mode = "gray4"
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Main configuration for the daemon and CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PaperviewConfig {
    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub renderer: RendererConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub dns: DnsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Refresh cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfig {
    /// Seconds between partial refreshes.
    #[serde(default = "super::defaults::default_quick_interval_secs")]
    pub quick_interval_secs: u64,

    /// Seconds between full refreshes. Must exceed `quick_interval_secs`.
    #[serde(default = "super::defaults::default_full_interval_secs")]
    pub full_interval_secs: u64,

    /// Scheduler sleep between decision passes, in milliseconds.
    #[serde(default = "super::defaults::default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wait after the content source was found unreachable.
    #[serde(default = "super::defaults::default_unreachable_wait_secs")]
    pub unreachable_wait_secs: u64,
}

/// Capture retry policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Total capture attempts per refresh cycle (not additional retries).
    #[serde(default = "super::defaults::default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts.
    #[serde(default = "super::defaults::default_retry_delay_secs")]
    pub delay_secs: u64,
}

/// The web page mirrored onto the panel, and its health probe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentConfig {
    #[serde(default = "super::defaults::default_content_host")]
    pub host: String,

    /// Path component of the rendered page, without leading slash.
    #[serde(default = "super::defaults::default_content_path")]
    pub path: String,

    #[serde(default = "super::defaults::default_probe_url")]
    pub probe_url: String,

    #[serde(default = "super::defaults::default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Alternate between the primary and the `second=true` view.
    #[serde(default = "super::defaults::default_second_view")]
    pub second_view: bool,

    #[serde(default = "super::defaults::default_view_toggle_secs")]
    pub view_toggle_secs: u64,
}

/// Headless browser engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RendererConfig {
    /// Path to the chromedriver binary. Looked up on `PATH` when missing.
    #[serde(default = "super::defaults::default_driver_path")]
    pub driver_path: String,

    #[serde(default = "super::defaults::default_driver_port")]
    pub driver_port: u16,

    #[serde(default = "super::defaults::default_window_width")]
    pub window_width: u32,

    #[serde(default = "super::defaults::default_window_height")]
    pub window_height: u32,

    #[serde(default = "super::defaults::default_page_load_timeout_secs")]
    pub page_load_timeout_secs: u64,

    /// How long to wait for a freshly spawned driver to report ready.
    #[serde(default = "super::defaults::default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
}

/// Panel init mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PanelMode {
    /// Black/white waveform.
    #[default]
    Mono,
    /// Four-level grayscale waveform.
    Gray4,
}

impl PanelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PanelMode::Mono => "mono",
            PanelMode::Gray4 => "gray4",
        }
    }
}

impl fmt::Display for PanelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PanelMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "mono" => Ok(PanelMode::Mono),
            "gray4" | "grey4" => Ok(PanelMode::Gray4),
            _ => Err(ConfigError::InvalidPanelMode { mode: value }),
        }
    }
}

impl From<PanelMode> for String {
    fn from(mode: PanelMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Panel wiring and geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    #[serde(default)]
    pub mode: PanelMode,

    #[serde(default = "super::defaults::default_spi_device")]
    pub spi_device: String,

    #[serde(default = "super::defaults::default_gpio_chip")]
    pub gpio_chip: String,

    /// BCM line numbers.
    #[serde(default = "super::defaults::default_rst_pin")]
    pub rst_pin: u32,

    #[serde(default = "super::defaults::default_dc_pin")]
    pub dc_pin: u32,

    #[serde(default = "super::defaults::default_busy_pin")]
    pub busy_pin: u32,

    #[serde(default = "super::defaults::default_panel_width")]
    pub width: u32,

    #[serde(default = "super::defaults::default_panel_height")]
    pub height: u32,
}

/// Control endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "super::defaults::default_bind")]
    pub bind: String,

    #[serde(default = "super::defaults::default_port")]
    pub port: u16,
}

/// Dynamic DNS synchronisation (Cloudflare).
///
/// Credentials are normally supplied through the environment rather than
/// written to a config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DnsConfig {
    #[serde(default = "super::defaults::default_dns_enabled")]
    pub enabled: bool,

    #[serde(default = "super::defaults::default_dns_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "super::defaults::default_dns_ttl")]
    pub ttl: u32,

    #[serde(default = "super::defaults::default_api_base")]
    pub api_base: String,

    /// Address used to discover the outbound interface. No packets are sent.
    #[serde(default = "super::defaults::default_route_probe")]
    pub route_probe: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Log file output. stderr logging is always on.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Cloudflare credentials, present only when all four values are set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsCredentials {
    pub api_token: String,
    pub zone_id: String,
    pub record_id: String,
    pub domain: String,
}

impl ScheduleConfig {
    pub fn quick_interval(&self) -> Duration {
        Duration::from_secs(self.quick_interval_secs)
    }

    pub fn full_interval(&self) -> Duration {
        Duration::from_secs(self.full_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn unreachable_wait(&self) -> Duration {
        Duration::from_secs(self.unreachable_wait_secs)
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl ContentConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn view_toggle_period(&self) -> Duration {
        Duration::from_secs(self.view_toggle_secs)
    }
}

impl RendererConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

impl DnsConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Credentials if sync is enabled and fully configured.
    pub fn credentials(&self) -> Option<DnsCredentials> {
        if !self.enabled {
            return None;
        }
        Some(DnsCredentials {
            api_token: self.api_token.clone().filter(|v| !v.is_empty())?,
            zone_id: self.zone_id.clone().filter(|v| !v.is_empty())?,
            record_id: self.record_id.clone().filter(|v| !v.is_empty())?,
            domain: self.domain.clone().filter(|v| !v.is_empty())?,
        })
    }
}

impl PaperviewConfig {
    /// Copy suitable for printing: secrets are masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.dns.api_token.is_some() {
            copy.dns.api_token = Some("********".to_string());
        }
        copy
    }
}

//! Default implementations for configuration types.
//!
//! This module contains all `Default` implementations and helper functions
//! for providing default values in serde deserialization.

use crate::config::types::{
    ContentConfig, DisplayConfig, DnsConfig, PanelMode, RendererConfig, RetryConfig,
    ScheduleConfig, ServerConfig,
};

pub fn default_quick_interval_secs() -> u64 {
    15
}

pub fn default_full_interval_secs() -> u64 {
    30 * 60
}

pub fn default_poll_interval_ms() -> u64 {
    1000
}

pub fn default_unreachable_wait_secs() -> u64 {
    10
}

/// Three attempts in total, matching the panel's tolerance for a slow page.
pub fn default_max_attempts() -> u32 {
    3
}

pub fn default_retry_delay_secs() -> u64 {
    5
}

pub fn default_content_host() -> String {
    "localhost".to_string()
}

pub fn default_content_path() -> String {
    "screen".to_string()
}

pub fn default_probe_url() -> String {
    "https://localhost/screen".to_string()
}

pub fn default_probe_timeout_secs() -> u64 {
    60
}

pub fn default_second_view() -> bool {
    true
}

pub fn default_view_toggle_secs() -> u64 {
    5 * 60
}

pub fn default_driver_path() -> String {
    "/usr/bin/chromedriver".to_string()
}

pub fn default_driver_port() -> u16 {
    9515
}

/// Browser window width. Screenshots are resized to the panel afterwards.
pub fn default_window_width() -> u32 {
    800
}

/// Slightly taller than the panel to leave room for browser chrome in
/// headless mode.
pub fn default_window_height() -> u32 {
    525
}

pub fn default_page_load_timeout_secs() -> u64 {
    30
}

pub fn default_startup_timeout_secs() -> u64 {
    20
}

pub fn default_spi_device() -> String {
    "/dev/spidev0.0".to_string()
}

pub fn default_gpio_chip() -> String {
    "/dev/gpiochip0".to_string()
}

pub fn default_rst_pin() -> u32 {
    17
}

pub fn default_dc_pin() -> u32 {
    25
}

pub fn default_busy_pin() -> u32 {
    24
}

pub fn default_panel_width() -> u32 {
    800
}

pub fn default_panel_height() -> u32 {
    480
}

pub fn default_bind() -> String {
    "0.0.0.0".to_string()
}

pub fn default_port() -> u16 {
    5002
}

pub fn default_dns_enabled() -> bool {
    true
}

pub fn default_dns_interval_secs() -> u64 {
    10 * 60
}

pub fn default_dns_ttl() -> u32 {
    120
}

pub fn default_api_base() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

pub fn default_route_probe() -> String {
    "8.8.8.8:80".to_string()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            quick_interval_secs: default_quick_interval_secs(),
            full_interval_secs: default_full_interval_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            unreachable_wait_secs: default_unreachable_wait_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_retry_delay_secs(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            host: default_content_host(),
            path: default_content_path(),
            probe_url: default_probe_url(),
            probe_timeout_secs: default_probe_timeout_secs(),
            second_view: default_second_view(),
            view_toggle_secs: default_view_toggle_secs(),
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            driver_path: default_driver_path(),
            driver_port: default_driver_port(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            page_load_timeout_secs: default_page_load_timeout_secs(),
            startup_timeout_secs: default_startup_timeout_secs(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: PanelMode::default(),
            spi_device: default_spi_device(),
            gpio_chip: default_gpio_chip(),
            rst_pin: default_rst_pin(),
            dc_pin: default_dc_pin(),
            busy_pin: default_busy_pin(),
            width: default_panel_width(),
            height: default_panel_height(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            enabled: default_dns_enabled(),
            interval_secs: default_dns_interval_secs(),
            ttl: default_dns_ttl(),
            api_base: default_api_base(),
            route_probe: default_route_probe(),
            api_token: None,
            zone_id: None,
            record_id: None,
            domain: None,
        }
    }
}

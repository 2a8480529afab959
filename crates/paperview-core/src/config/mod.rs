//! # Configuration System
//!
//! Hierarchical TOML configuration for the paperview daemon and CLI.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.paperview/config.toml`
//! 3. **Project config** - `./.paperview/config.toml`
//! 4. **Explicit file** - `--config <path>`
//! 5. **Environment** - Cloudflare secrets and the log directory
//! 6. **CLI arguments** - Command-line flags (highest priority)
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use paperview_core::config::PaperviewConfig;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PaperviewConfig::load_hierarchy(None)?;
//!     println!("quick refresh every {:?}", config.schedule.quick_interval());
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

use std::path::Path;

pub use types::{
    ContentConfig, DisplayConfig, DnsConfig, DnsCredentials, LoggingConfig, PaperviewConfig,
    PanelMode, RendererConfig, RetryConfig, ScheduleConfig, ServerConfig,
};
pub use validation::validate_config;

impl PaperviewConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy(explicit: Option<&Path>) -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy(explicit)
    }

    /// Validate the configuration.
    ///
    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }
}

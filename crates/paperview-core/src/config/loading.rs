//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.paperview/config.toml`
//! 3. **Project config** - `./.paperview/config.toml`
//! 4. **Explicit file** - `--config <path>` (must exist)
//! 5. **Environment** - `PAPERVIEW_LOG_DIR` and the `CLOUDFLARE_*` secrets
//!
//! Files are merged key by key before deserialization, so a project file that
//! only sets `[schedule] quick_interval_secs` keeps every other user setting.

use std::fs;
use std::path::{Path, PathBuf};

use toml::Table;
use tracing::debug;

use crate::config::types::PaperviewConfig;
use crate::config::validation::validate_config;
use crate::errors::ConfigError;

/// Directory name under `$HOME` and the working directory.
pub const CONFIG_DIR_NAME: &str = ".paperview";

/// Environment variables that override config values.
pub const ENV_LOG_DIR: &str = "PAPERVIEW_LOG_DIR";
pub const ENV_CLOUDFLARE_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";
pub const ENV_CLOUDFLARE_ZONE_ID: &str = "CLOUDFLARE_ZONE_ID";
pub const ENV_CLOUDFLARE_RECORD_ID: &str = "CLOUDFLARE_RECORD_ID";
pub const ENV_CLOUDFLARE_DOMAIN: &str = "CLOUDFLARE_DOMAIN";

/// Load configuration from the hierarchy of config files and the environment.
///
/// # Errors
///
/// Returns an error if a present file cannot be parsed, if `explicit` is given
/// but missing, or if the merged configuration fails validation. Missing
/// user/project files are not errors.
pub fn load_hierarchy(explicit: Option<&Path>) -> Result<PaperviewConfig, ConfigError> {
    let mut merged = Table::new();

    for path in [user_config_path(), project_config_path()]
        .into_iter()
        .flatten()
    {
        if let Some(table) = read_optional_table(&path)? {
            debug!(event = "core.config.file_loaded", path = %path.display());
            merge_tables(&mut merged, table);
        }
    }

    if let Some(path) = explicit {
        let table = read_optional_table(path)?.ok_or_else(|| ConfigError::ConfigNotFound {
            path: path.display().to_string(),
        })?;
        debug!(event = "core.config.file_loaded", path = %path.display());
        merge_tables(&mut merged, table);
    }

    let config = from_table(merged)?;
    let config = apply_env_overrides(config, |key| std::env::var(key).ok());

    validate_config(&config)?;

    Ok(config)
}

/// Load a single configuration file on top of the defaults.
///
/// # Errors
///
/// Returns an error if the file is missing or cannot be parsed.
pub fn load_config_file(path: &Path) -> Result<PaperviewConfig, ConfigError> {
    let table = read_optional_table(path)?.ok_or_else(|| ConfigError::ConfigNotFound {
        path: path.display().to_string(),
    })?;
    from_table(table)
}

/// Apply environment overrides. `lookup` returns the value of a variable.
pub fn apply_env_overrides(
    mut config: PaperviewConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> PaperviewConfig {
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(dir) = non_empty(ENV_LOG_DIR) {
        config.logging.dir = Some(dir);
    }
    if let Some(token) = non_empty(ENV_CLOUDFLARE_API_TOKEN) {
        config.dns.api_token = Some(token);
    }
    if let Some(zone) = non_empty(ENV_CLOUDFLARE_ZONE_ID) {
        config.dns.zone_id = Some(zone);
    }
    if let Some(record) = non_empty(ENV_CLOUDFLARE_RECORD_ID) {
        config.dns.record_id = Some(record);
    }
    if let Some(domain) = non_empty(ENV_CLOUDFLARE_DOMAIN) {
        config.dns.domain = Some(domain);
    }

    config
}

/// Recursively merge `overlay` into `base`. Tables merge key by key; any
/// other value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(CONFIG_DIR_NAME).join("config.toml"))
}

/// Read and parse a TOML file. A missing file is `Ok(None)`.
fn read_optional_table(path: &Path) -> Result<Option<Table>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::IoError { source: e }),
    };

    content
        .parse::<Table>()
        .map(Some)
        .map_err(|e| ConfigError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

fn from_table(table: Table) -> Result<PaperviewConfig, ConfigError> {
    toml::Value::Table(table)
        .try_into::<PaperviewConfig>()
        .map_err(|e| ConfigError::ConfigParseError {
            path: "<merged>".to_string(),
            message: e.to_string(),
        })
}

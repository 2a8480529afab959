use crate::config::types::PaperviewConfig;
use crate::errors::ConfigError;

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConfiguration {
        message: message.into(),
    }
}

/// Validate the merged configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidConfiguration`] naming the first offending key.
pub fn validate_config(config: &PaperviewConfig) -> Result<(), ConfigError> {
    let schedule = &config.schedule;
    if schedule.quick_interval_secs == 0 {
        return Err(invalid("schedule.quick_interval_secs must be greater than 0"));
    }
    if schedule.full_interval_secs <= schedule.quick_interval_secs {
        return Err(invalid(format!(
            "schedule.full_interval_secs ({}) must be greater than schedule.quick_interval_secs ({})",
            schedule.full_interval_secs, schedule.quick_interval_secs
        )));
    }
    if schedule.poll_interval_ms == 0 {
        return Err(invalid("schedule.poll_interval_ms must be greater than 0"));
    }

    if config.retry.max_attempts == 0 {
        return Err(invalid("retry.max_attempts must be at least 1"));
    }

    if config.content.host.trim().is_empty() {
        return Err(invalid("content.host cannot be empty"));
    }
    if config.content.second_view && config.content.view_toggle_secs == 0 {
        return Err(invalid(
            "content.view_toggle_secs must be greater than 0 when content.second_view is enabled",
        ));
    }

    let display = &config.display;
    if display.width == 0 || display.height == 0 {
        return Err(invalid("display.width and display.height must be greater than 0"));
    }
    if display.width % 8 != 0 {
        return Err(invalid(format!(
            "display.width ({}) must be a multiple of 8",
            display.width
        )));
    }

    if config.renderer.window_width == 0 || config.renderer.window_height == 0 {
        return Err(invalid("renderer window size must be greater than 0"));
    }
    if config.renderer.page_load_timeout_secs == 0 {
        return Err(invalid("renderer.page_load_timeout_secs must be greater than 0"));
    }

    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.dns.enabled && config.dns.interval_secs == 0 {
        return Err(invalid("dns.interval_secs must be greater than 0"));
    }

    Ok(())
}

use tracing::info;

use paperview_core::config::PaperviewConfig;

pub fn handle_config_command(config: &PaperviewConfig) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = toml::to_string_pretty(&config.redacted())?;
    print!("{rendered}");
    info!(event = "cli.config_printed");
    Ok(())
}

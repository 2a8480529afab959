use tracing::{error, info};

use paperview_core::config::PaperviewConfig;
use paperview_core::display::clear_panel;
use paperview_core::errors::PaperviewError;

pub fn handle_clear_command(config: &PaperviewConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(event = "cli.clear_started", device = %config.display.spi_device);

    let runtime = super::runtime()?;
    if let Err(e) = runtime.block_on(clear_panel(&config.display)) {
        error!(
            event = "cli.clear_failed",
            error = %e,
            error_code = e.error_code(),
        );
        return Err(e.into());
    }

    println!("Panel cleared");
    info!(event = "cli.clear_completed");
    Ok(())
}

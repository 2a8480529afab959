use std::path::Path;

use clap::ArgMatches;
use tracing::{error, info};

use paperview_core::capture::capture_once;
use paperview_core::config::PaperviewConfig;
use paperview_core::errors::PaperviewError;
use paperview_core::net::RoutedAddressSource;
use paperview_core::render::ChromeDriverLauncher;

pub fn handle_capture_command(
    matches: &ArgMatches,
    config: &PaperviewConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let out = matches
        .get_one::<String>("out")
        .ok_or("--out is required")?;
    info!(event = "cli.capture_started", out = %out);

    let launcher = ChromeDriverLauncher::new(&config.renderer);
    let address = RoutedAddressSource::new(config.dns.route_probe.clone());

    let runtime = super::runtime()?;
    let bitmap = match runtime.block_on(capture_once(config, launcher, &address)) {
        Ok(bitmap) => bitmap,
        Err(e) => {
            error!(
                event = "cli.capture_failed",
                error = %e,
                error_code = e.error_code(),
            );
            return Err(e.into());
        }
    };

    bitmap.save(Path::new(out))?;
    println!(
        "Saved {}x{} capture to {}",
        bitmap.width(),
        bitmap.height(),
        out
    );
    info!(event = "cli.capture_completed", out = %out);
    Ok(())
}

use clap::ArgMatches;
use tracing::{error, info};

use paperview_core::config::PaperviewConfig;
use paperview_core::errors::{ConfigError, PaperviewError};

/// Apply `run` flags on top of the loaded config and re-validate.
pub fn apply_overrides(
    config: &mut PaperviewConfig,
    matches: &ArgMatches,
) -> Result<(), ConfigError> {
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }
    config.validate()
}

pub fn handle_run_command(config: PaperviewConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        event = "cli.run_started",
        port = config.server.port,
        mode = %config.display.mode,
    );

    let runtime = super::runtime()?;
    match runtime.block_on(paperview_daemon::run_daemon(config)) {
        Ok(()) => {
            info!(event = "cli.run_completed");
            Ok(())
        }
        Err(e) => {
            error!(
                event = "cli.run_failed",
                error = %e,
                error_code = e.error_code(),
                user_error = e.is_user_error(),
            );
            Err(e.into())
        }
    }
}

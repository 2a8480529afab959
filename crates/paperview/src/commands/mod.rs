use std::path::Path;

use clap::ArgMatches;
use tracing::error;

use paperview_core::config::PaperviewConfig;
use paperview_core::errors::ConfigError;
use paperview_core::logging::{LoggingGuard, LoggingOptions, Verbosity};
use paperview_core::{events, init_logging};

mod capture;
mod clear;
mod config;
mod run;

/// Run the selected subcommand. Failures are reported on stderr here; the
/// caller only maps the result to an exit code.
pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let result = execute(matches);
    if let Err(e) = &result {
        eprintln!("paperview: {e}");
    }
    result
}

fn execute(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(matches)?;
    if let Some(("run", sub_matches)) = matches.subcommand() {
        run::apply_overrides(&mut config, sub_matches)?;
    }

    let _guard = start_logging(matches, &config)?;
    let command = matches.subcommand_name().unwrap_or("none");
    events::log_app_startup(command);

    let result = match matches.subcommand() {
        Some(("run", _)) => run::handle_run_command(config),
        Some(("config", _)) => config::handle_config_command(&config),
        Some(("capture", sub_matches)) => capture::handle_capture_command(sub_matches, &config),
        Some(("clear", _)) => clear::handle_clear_command(&config),
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    };

    if let Err(e) = &result {
        events::log_app_error(command, e.as_ref());
    }
    events::log_app_shutdown(command, result.is_ok());
    result
}

fn load_config(matches: &ArgMatches) -> Result<PaperviewConfig, ConfigError> {
    let explicit = matches.get_one::<String>("config").map(Path::new);
    PaperviewConfig::load_hierarchy(explicit)
}

fn start_logging(
    matches: &ArgMatches,
    config: &PaperviewConfig,
) -> Result<LoggingGuard, std::io::Error> {
    let verbosity = if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else {
        Verbosity::Normal
    };
    init_logging(&LoggingOptions {
        verbosity,
        log_dir: config.logging.dir.as_ref().map(Into::into),
    })
}

/// Runtime for commands that talk to the browser or the panel.
fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

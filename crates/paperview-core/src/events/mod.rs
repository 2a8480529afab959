//! Process lifecycle events.
//!
//! Every CLI invocation logs one startup and one shutdown event tagged with
//! its subcommand, so a restart loop under a service manager shows up in the
//! log without correlating pids.

use std::error::Error;

use tracing::{error, info};

pub fn log_app_startup(command: &str) {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION"),
        command = command,
        pid = std::process::id(),
    );
}

pub fn log_app_shutdown(command: &str, success: bool) {
    info!(
        event = "core.app.shutdown_started",
        command = command,
        success = success,
    );
}

/// Log the error that ends a command, with every underlying cause.
pub fn log_app_error(command: &str, error: &(dyn Error + 'static)) {
    error!(
        event = "core.app.error_occurred",
        command = command,
        error = %error,
        causes = ?source_chain(error),
    );
}

/// Messages of `error`'s sources, outermost first. The error itself is not
/// included.
pub fn source_chain(error: &(dyn Error + 'static)) -> Vec<String> {
    let mut causes = Vec::new();
    let mut current = error.source();
    while let Some(source) = current {
        causes.push(source.to_string());
        current = source.source();
    }
    causes
}

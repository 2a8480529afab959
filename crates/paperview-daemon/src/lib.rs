//! paperview-daemon: long-running refresh service
//!
//! Wires the core refresh orchestrator to real hardware and the outside
//! world: the HTTP control surface, the DNS sync task and process signals.
//!
//! [`run_daemon`] is the production entry point. [`run_with_parts`] takes an
//! already-built orchestrator and listener, and is what the integration
//! tests drive.

pub mod dns;
pub mod errors;
pub mod server;
pub mod signals;

use std::sync::Arc;
use std::time::Duration;

use paperview_core::config::PaperviewConfig;
use paperview_core::display::PanelDevice;
use paperview_core::errors::PaperviewError;
use paperview_core::health::{ContentProbe, HttpContentProbe};
use paperview_core::net::{AddressSource, RoutedAddressSource};
use paperview_core::refresh::RefreshOrchestrator;
use paperview_core::render::{BrowserLauncher, ChromeDriverLauncher};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub use dns::{CloudflareClient, DnsError, DnsRecordApi, SyncOutcome, run_dns_sync, sync_once};
pub use errors::DaemonError;

/// DNS sync wiring for [`run_with_parts`].
pub struct DnsSync<R, A> {
    pub api: R,
    pub address: A,
    pub interval: Duration,
}

/// Build the DNS sync task from config.
///
/// `None` when sync is disabled, credentials are missing or the HTTP client
/// cannot be built. DNS sync never blocks the panel from refreshing.
pub fn dns_sync_from_config(
    config: &PaperviewConfig,
) -> Option<DnsSync<CloudflareClient, RoutedAddressSource>> {
    if !config.dns.enabled {
        info!(event = "daemon.dns.disabled", reason = "disabled_in_config");
        return None;
    }
    let Some(credentials) = config.dns.credentials() else {
        info!(event = "daemon.dns.disabled", reason = "missing_credentials");
        return None;
    };

    let api = match CloudflareClient::new(config.dns.api_base.clone(), credentials, config.dns.ttl)
    {
        Ok(api) => api,
        Err(e) => {
            error!(
                event = "daemon.dns.disabled",
                reason = "client_build_failed",
                error = %e,
                error_code = e.error_code(),
            );
            return None;
        }
    };
    Some(DnsSync {
        api,
        address: RoutedAddressSource::new(config.dns.route_probe.clone()),
        interval: config.dns.interval(),
    })
}

/// Run the daemon on the configured panel until SIGINT or SIGTERM.
///
/// # Errors
///
/// Fails fast only if the panel cannot be opened or the control port cannot
/// be bound. A missing chromedriver or unreachable content source is retried
/// by the refresh cycles.
#[cfg(target_os = "linux")]
pub async fn run_daemon(config: PaperviewConfig) -> Result<(), DaemonError> {
    let panel = paperview_core::display::linux::open_panel(&config.display)
        .map_err(|source| DaemonError::DisplayOpen { source })?;
    run_with_panel(&config, panel, CancellationToken::new()).await
}

#[cfg(not(target_os = "linux"))]
pub async fn run_daemon(_config: PaperviewConfig) -> Result<(), DaemonError> {
    Err(DaemonError::DisplayOpen {
        source: paperview_core::DisplayError::Unsupported {
            message: "SPI e-paper panels are only supported on Linux".to_string(),
        },
    })
}

/// Run the daemon against an already opened panel until SIGINT, SIGTERM or
/// `shutdown` is cancelled.
pub async fn run_with_panel<D: PanelDevice>(
    config: &PaperviewConfig,
    panel: D,
    shutdown: CancellationToken,
) -> Result<(), DaemonError> {
    let launcher = ChromeDriverLauncher::new(&config.renderer);
    let probe = HttpContentProbe::new(&config.content);
    let address = RoutedAddressSource::new(config.dns.route_probe.clone());
    let dns = dns_sync_from_config(config);
    let listener = server::bind(&config.server.bind, config.server.port).await?;

    let orchestrator = Arc::new(RefreshOrchestrator::new(
        config,
        launcher,
        panel,
        probe,
        address,
        shutdown.clone(),
    ));

    let signals = tokio::spawn(signals::watch_signals(shutdown.clone()));
    let result = run_with_parts(orchestrator, listener, dns).await;

    shutdown.cancel();
    if let Err(e) = signals.await {
        warn!(event = "daemon.runner.task_join_failed", task = "signals", error = %e);
    }
    result
}

/// Drive an orchestrator until its shutdown token is cancelled.
///
/// Initialises the panel, spawns the control server and the optional DNS
/// task, runs the scheduler, then tears everything down exactly once.
///
/// # Errors
///
/// Returns the control server's error, if it failed. Teardown runs either way.
pub async fn run_with_parts<L, D, P, A, R, B>(
    orchestrator: Arc<RefreshOrchestrator<L, D, P, A>>,
    listener: TcpListener,
    dns: Option<DnsSync<R, B>>,
) -> Result<(), DaemonError>
where
    L: BrowserLauncher + 'static,
    D: PanelDevice,
    P: ContentProbe + 'static,
    A: AddressSource + 'static,
    R: DnsRecordApi + 'static,
    B: AddressSource + 'static,
{
    let shutdown = orchestrator.shutdown_token().clone();
    info!(event = "daemon.runner.start_started");

    if let Err(e) = orchestrator.initialize_display().await {
        // The first cycle retries the init.
        error!(
            event = "daemon.runner.display_init_failed",
            error = %e,
            error_code = e.error_code(),
        );
    }

    let server = tokio::spawn(server::serve(
        listener,
        server::router(Arc::clone(&orchestrator)),
        shutdown.clone(),
    ));
    let dns_task = dns.map(|sync| {
        tokio::spawn(run_dns_sync(
            sync.api,
            sync.address,
            sync.interval,
            shutdown.clone(),
        ))
    });
    info!(event = "daemon.runner.start_completed");

    // Returns once the token is cancelled, after any cycle in progress.
    orchestrator.run_scheduler().await;

    info!(event = "daemon.runner.shutdown_started");
    orchestrator.teardown().await;

    let server_result = match server.await {
        Ok(result) => result,
        Err(e) => Err(DaemonError::TaskFailed {
            message: format!("control server: {e}"),
        }),
    };
    if let Some(task) = dns_task {
        if let Err(e) = task.await {
            warn!(event = "daemon.runner.task_join_failed", task = "dns", error = %e);
        }
    }
    info!(event = "daemon.runner.shutdown_completed");
    server_result
}

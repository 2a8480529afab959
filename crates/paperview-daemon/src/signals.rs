use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancel `shutdown` on SIGINT or SIGTERM. Returns early if something else
/// cancels it first.
///
/// SIGTERM is only watched on unix; elsewhere Ctrl-C is the only signal.
pub async fn watch_signals(shutdown: CancellationToken) {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(event = "daemon.signal.install_failed", signal = "SIGINT", error = %e);
            std::future::pending::<()>().await;
        }
    };

    let received = tokio::select! {
        _ = shutdown.cancelled() => return,
        _ = interrupt => "SIGINT",
        _ = terminate() => "SIGTERM",
    };

    info!(event = "daemon.signal.received", signal = received);
    shutdown.cancel();
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!(event = "daemon.signal.install_failed", signal = "SIGTERM", error = %e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

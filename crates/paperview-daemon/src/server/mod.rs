//! HTTP control surface.
//!
//! `GET /updatescreen` runs one full refresh through the orchestrator, queued
//! behind any cycle already in progress, and answers once it is done.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use paperview_core::display::PanelDevice;
use paperview_core::health::ContentProbe;
use paperview_core::net::AddressSource;
use paperview_core::refresh::RefreshOrchestrator;
use paperview_core::render::BrowserLauncher;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::errors::DaemonError;

pub const UPDATE_ROUTE: &str = "/updatescreen";
pub const UPDATE_RESPONSE: &str = "Screen updated successfully";

/// Build the control router.
pub fn router<L, D, P, A>(orchestrator: Arc<RefreshOrchestrator<L, D, P, A>>) -> Router
where
    L: BrowserLauncher + 'static,
    D: PanelDevice,
    P: ContentProbe + 'static,
    A: AddressSource + 'static,
{
    Router::new()
        .route(UPDATE_ROUTE, get(update_screen::<L, D, P, A>))
        .with_state(orchestrator)
}

async fn update_screen<L, D, P, A>(
    State(orchestrator): State<Arc<RefreshOrchestrator<L, D, P, A>>>,
) -> (StatusCode, &'static str)
where
    L: BrowserLauncher + 'static,
    D: PanelDevice,
    P: ContentProbe + 'static,
    A: AddressSource + 'static,
{
    info!(event = "daemon.server.request_received", route = UPDATE_ROUTE);
    let outcome = orchestrator.trigger_full_refresh().await;
    info!(
        event = "daemon.server.request_completed",
        route = UPDATE_ROUTE,
        outcome = ?outcome,
    );
    (StatusCode::OK, UPDATE_RESPONSE)
}

/// Serve `router` on `listener` until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns [`DaemonError::Server`] if the accept loop fails.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), DaemonError> {
    let addr = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_default();
    info!(event = "daemon.server.listen_started", addr = %addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|source| DaemonError::Server { source })?;

    info!(event = "daemon.server.listen_stopped", addr = %addr);
    Ok(())
}

/// Bind the control listener.
///
/// # Errors
///
/// Returns [`DaemonError::Bind`] if the address is unavailable.
pub async fn bind(bind: &str, port: u16) -> Result<TcpListener, DaemonError> {
    let addr = format!("{bind}:{port}");
    TcpListener::bind(&addr)
        .await
        .map_err(|source| DaemonError::Bind { addr, source })
}

//! Keeps a public DNS A record pointed at this host's local address.
//!
//! Runs on its own cadence and shares nothing with the refresh orchestrator
//! except the shutdown token.

mod cloudflare;
mod errors;

use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;

use paperview_core::errors::PaperviewError;
use paperview_core::net::{AddressSource, is_placeholder};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use cloudflare::CloudflareClient;
pub use errors::DnsError;

/// Read and write access to one DNS A record.
pub trait DnsRecordApi: Send + Sync {
    fn current_address(&self) -> impl Future<Output = Result<IpAddr, DnsError>> + Send;

    fn update_address(&self, ip: IpAddr) -> impl Future<Output = Result<(), DnsError>> + Send;
}

/// What one sync pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No routable local address; the record was left alone.
    SkippedPlaceholder,
    Unchanged,
    /// `previous` is `None` when the remote record could not be read.
    Updated {
        previous: Option<IpAddr>,
        current: IpAddr,
    },
}

/// Compare the local address against the record and update it if needed.
///
/// A failed remote read counts as "different", so the record is rewritten.
///
/// # Errors
///
/// Returns the update error; read errors are logged and absorbed.
pub async fn sync_once<R, A>(api: &R, address: &A) -> Result<SyncOutcome, DnsError>
where
    R: DnsRecordApi,
    A: AddressSource,
{
    let local = address.local_address();
    if is_placeholder(local) {
        warn!(event = "daemon.dns.sync_skipped", reason = "no_routable_address");
        return Ok(SyncOutcome::SkippedPlaceholder);
    }

    let remote = match api.current_address().await {
        Ok(ip) => Some(ip),
        Err(e) => {
            warn!(
                event = "daemon.dns.record_read_failed",
                error = %e,
                error_code = e.error_code(),
            );
            None
        }
    };

    if remote == Some(local) {
        debug!(event = "daemon.dns.sync_completed", ip = %local, changed = false);
        return Ok(SyncOutcome::Unchanged);
    }

    api.update_address(local).await?;
    info!(
        event = "daemon.dns.record_updated",
        previous = ?remote,
        current = %local,
    );
    Ok(SyncOutcome::Updated {
        previous: remote,
        current: local,
    })
}

/// Run [`sync_once`] every `interval` until `shutdown` is cancelled.
pub async fn run_dns_sync<R, A>(
    api: R,
    address: A,
    interval: Duration,
    shutdown: CancellationToken,
) where
    R: DnsRecordApi,
    A: AddressSource,
{
    info!(
        event = "daemon.dns.sync_started",
        interval_secs = interval.as_secs(),
    );
    loop {
        if let Err(e) = sync_once(&api, &address).await {
            error!(
                event = "daemon.dns.sync_failed",
                error = %e,
                error_code = e.error_code(),
            );
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    info!(event = "daemon.dns.sync_stopped");
}

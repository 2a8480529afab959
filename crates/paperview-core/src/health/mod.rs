//! Content source health probe.
//!
//! The orchestrator asks the probe before every decision pass. An unreachable
//! source is not an error of the refresh cycle; it switches the panel to the
//! blank fallback.

pub mod errors;

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::ContentConfig;
use crate::errors::PaperviewError;

pub use errors::ProbeError;

/// Reachability check for the rendered page's backing service.
pub trait ContentProbe: Send + Sync {
    /// `true` when the content source answers with `200 OK`.
    fn is_reachable(&self) -> impl Future<Output = bool> + Send;
}

/// HTTP GET probe with a short timeout and relaxed certificate checks.
///
/// Self-hosted dashboards commonly serve a self-signed certificate on the
/// local network, so certificate errors are accepted. The client is built on
/// first use; a client that cannot be built reports the source unreachable.
#[derive(Debug, Clone)]
pub struct HttpContentProbe {
    client: OnceCell<reqwest::Client>,
    timeout: Duration,
    url: String,
}

impl HttpContentProbe {
    /// Build a probe from the `[content]` section.
    pub fn new(config: &ContentConfig) -> Self {
        Self {
            client: OnceCell::new(),
            timeout: config.probe_timeout(),
            url: config.probe_url.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn client(&self) -> Result<&reqwest::Client, ProbeError> {
        self.client
            .get_or_try_init(|| async {
                reqwest::Client::builder()
                    .timeout(self.timeout)
                    .danger_accept_invalid_certs(true)
                    .build()
                    .map_err(|e| ProbeError::ClientBuildFailed {
                        message: e.to_string(),
                    })
            })
            .await
    }

    /// Issue one probe request.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::SourceUnreachable`] on transport failure,
    /// [`ProbeError::UnexpectedStatus`] for anything but `200` and
    /// [`ProbeError::ClientBuildFailed`] if the TLS backend cannot be
    /// initialised.
    pub async fn check(&self) -> Result<(), ProbeError> {
        let response = self
            .client()
            .await?
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ProbeError::SourceUnreachable {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(ProbeError::UnexpectedStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            })
        }
    }
}

impl ContentProbe for HttpContentProbe {
    async fn is_reachable(&self) -> bool {
        match self.check().await {
            Ok(()) => {
                debug!(event = "core.health.probe_completed", url = %self.url);
                true
            }
            Err(e) => {
                warn!(
                    event = "core.health.probe_failed",
                    url = %self.url,
                    error = %e,
                    error_code = e.error_code(),
                );
                false
            }
        }
    }
}

//! chromedriver process management.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::config::RendererConfig;
use crate::render::{BrowserLauncher, RenderError, WebDriverSession};

/// Extra time allowed on top of the page-load timeout for a single
/// WebDriver round trip.
const REQUEST_MARGIN: Duration = Duration::from_secs(15);

const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Find the chromedriver binary.
///
/// Uses `configured` when it exists, otherwise searches `PATH` for a binary
/// with the same file name.
pub fn resolve_driver_path(configured: &str) -> Result<PathBuf, RenderError> {
    let path = Path::new(configured);
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    let name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "chromedriver".into());
    which::which(&name).map_err(|_| RenderError::DriverNotFound {
        path: configured.to_string(),
    })
}

/// True when a `GET /status` body reports the driver ready.
pub fn status_is_ready(body: &Value) -> bool {
    body.pointer("/value/ready")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Spawns one chromedriver child process and opens sessions on it.
///
/// Nothing is resolved at construction: the binary is looked up and the HTTP
/// client built on the first [`launch`](BrowserLauncher::launch), so a missing
/// driver surfaces as a retryable [`RenderError`] from session acquisition.
/// The child is respawned if it has exited by the time a session is needed.
/// It is killed on [`shutdown`](BrowserLauncher::shutdown) or when the
/// launcher is dropped.
pub struct ChromeDriverLauncher {
    config: RendererConfig,
    client: OnceCell<reqwest::Client>,
    child: Mutex<Option<Child>>,
}

impl ChromeDriverLauncher {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            config: config.clone(),
            client: OnceCell::new(),
            child: Mutex::new(None),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.config.driver_port)
    }

    async fn client(&self) -> Result<&reqwest::Client, RenderError> {
        self.client
            .get_or_try_init(|| async {
                reqwest::Client::builder()
                    .timeout(self.config.page_load_timeout() + REQUEST_MARGIN)
                    .build()
                    .map_err(RenderError::from)
            })
            .await
    }

    async fn ensure_running(&self) -> Result<(), RenderError> {
        let mut guard = self.child.lock().await;

        if let Some(child) = guard.as_mut() {
            match child.try_wait() {
                Ok(None) => return Ok(()),
                Ok(Some(status)) => warn!(
                    event = "core.render.driver_exited",
                    status = %status,
                ),
                Err(e) => warn!(event = "core.render.driver_wait_failed", error = %e),
            }
            *guard = None;
        }

        let binary = resolve_driver_path(&self.config.driver_path)?;
        info!(
            event = "core.render.driver_spawn_started",
            binary = %binary.display(),
            port = self.config.driver_port,
        );
        let child = Command::new(&binary)
            .arg(format!("--port={}", self.config.driver_port))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderError::DriverSpawnFailed {
                message: e.to_string(),
            })?;
        debug!(event = "core.render.driver_spawned", pid = ?child.id());
        *guard = Some(child);

        self.wait_ready().await?;
        info!(event = "core.render.driver_spawn_completed");
        Ok(())
    }

    async fn wait_ready(&self) -> Result<(), RenderError> {
        let status_url = format!("{}/status", self.base_url());
        let poll = async {
            loop {
                if self.probe_status(&status_url).await {
                    return;
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(self.config.startup_timeout(), poll)
            .await
            .map_err(|_| RenderError::DriverNotReady {
                timeout_secs: self.config.startup_timeout_secs,
            })
    }

    async fn probe_status(&self, status_url: &str) -> bool {
        let Ok(client) = self.client().await else {
            return false;
        };
        match client.get(status_url).send().await {
            Ok(response) => match response.json::<Value>().await {
                Ok(body) => status_is_ready(&body),
                Err(_) => false,
            },
            Err(_) => false,
        }
    }
}

impl BrowserLauncher for ChromeDriverLauncher {
    type Browser = WebDriverSession;

    async fn launch(&self) -> Result<WebDriverSession, RenderError> {
        self.ensure_running().await?;
        let client = self.client().await?.clone();
        WebDriverSession::create(client, self.base_url(), &self.config).await
    }

    async fn shutdown(&self) {
        let mut guard = self.child.lock().await;
        if let Some(mut child) = guard.take() {
            match child.kill().await {
                Ok(()) => info!(event = "core.render.driver_stopped"),
                Err(e) => warn!(event = "core.render.driver_stop_failed", error = %e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_driver_path_prefers_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("chromedriver");
        std::fs::write(&binary, b"").unwrap();

        let resolved = resolve_driver_path(binary.to_str().unwrap()).unwrap();
        assert_eq!(resolved, binary);
    }

    #[test]
    fn test_resolve_driver_path_missing() {
        let err = resolve_driver_path("/nonexistent/paperview-no-such-driver").unwrap_err();
        assert!(matches!(err, RenderError::DriverNotFound { .. }));
    }

    #[test]
    fn test_status_is_ready() {
        assert!(status_is_ready(&json!({ "value": { "ready": true, "message": "ok" } })));
        assert!(!status_is_ready(&json!({ "value": { "ready": false } })));
        assert!(!status_is_ready(&json!({})));
    }

    #[test]
    fn test_launcher_base_url_uses_port() {
        let config = RendererConfig {
            driver_port: 9600,
            ..RendererConfig::default()
        };
        let launcher = ChromeDriverLauncher::new(&config);
        assert_eq!(launcher.base_url(), "http://127.0.0.1:9600");
    }

    #[tokio::test]
    async fn test_missing_driver_fails_at_launch_not_construction() {
        let config = RendererConfig {
            driver_path: "/nonexistent/paperview-no-such-driver".to_string(),
            ..RendererConfig::default()
        };
        let launcher = ChromeDriverLauncher::new(&config);

        let err = launcher.launch().await.unwrap_err();
        assert!(matches!(err, RenderError::DriverNotFound { .. }));

        // Still usable after the failure; the next launch retries the lookup.
        let err = launcher.launch().await.unwrap_err();
        assert!(matches!(err, RenderError::DriverNotFound { .. }));
        launcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_driver_is_retried_by_session_manager() {
        use crate::render::SessionManager;

        let config = RendererConfig {
            driver_path: "/nonexistent/paperview-no-such-driver".to_string(),
            ..RendererConfig::default()
        };
        let mut sessions = SessionManager::new(ChromeDriverLauncher::new(&config));

        assert!(matches!(
            sessions.acquire_session().await,
            Err(RenderError::DriverNotFound { .. })
        ));
        assert!(matches!(
            sessions.acquire_session().await,
            Err(RenderError::DriverNotFound { .. })
        ));
        sessions.close().await;
    }
}

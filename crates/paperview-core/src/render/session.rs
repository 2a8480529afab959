use tracing::{debug, info, warn};

use crate::errors::PaperviewError;
use crate::render::{Browser, BrowserLauncher, RenderError};

/// Lazily created, reusable browser session.
///
/// Never holds more than one session: a replacement is only launched after
/// the previous one has been quit and dropped.
pub struct SessionManager<L: BrowserLauncher> {
    launcher: L,
    session: Option<L::Browser>,
    suspect: bool,
    closed: bool,
    sessions_created: u64,
    invalidations: u64,
}

impl<L: BrowserLauncher> SessionManager<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            session: None,
            suspect: false,
            closed: false,
            sessions_created: 0,
            invalidations: 0,
        }
    }

    /// Return a live session, creating or replacing it as needed.
    ///
    /// An existing session is probed by reading its current URL. A session
    /// that fails the probe, or was marked suspect, is quit and replaced.
    ///
    /// # Errors
    ///
    /// Returns the launcher's error when no session could be created, or
    /// [`RenderError::SessionManagerClosed`] after [`close`](Self::close).
    pub async fn acquire_session(&mut self) -> Result<&L::Browser, RenderError> {
        if self.closed {
            return Err(RenderError::SessionManagerClosed);
        }

        let browser = match self.session.take() {
            Some(browser) if self.suspect => {
                debug!(event = "core.render.session_discarded", reason = "suspect");
                quit_quietly(browser).await;
                self.launch().await?
            }
            Some(browser) => match browser.current_url().await {
                Ok(_) => {
                    debug!(event = "core.render.session_reused");
                    browser
                }
                Err(e) => {
                    warn!(
                        event = "core.render.session_dead",
                        error = %e,
                        error_code = e.error_code(),
                    );
                    quit_quietly(browser).await;
                    self.launch().await?
                }
            },
            None => self.launch().await?,
        };
        self.suspect = false;

        Ok(&*self.session.insert(browser))
    }

    /// Quit and drop the current session, if any.
    pub async fn invalidate(&mut self) {
        self.invalidations += 1;
        self.suspect = false;
        let had_session = self.session.is_some();
        if let Some(browser) = self.session.take() {
            quit_quietly(browser).await;
        }
        info!(
            event = "core.render.session_invalidated",
            had_session = had_session,
            invalidations = self.invalidations,
        );
    }

    /// Flag the current session as untrustworthy; the next
    /// [`acquire_session`](Self::acquire_session) replaces it.
    pub fn mark_suspect(&mut self) {
        if self.session.is_some() {
            self.suspect = true;
        }
    }

    /// Quit the session and shut the engine down. Idempotent.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(browser) = self.session.take() {
            quit_quietly(browser).await;
        }
        self.launcher.shutdown().await;
        info!(event = "core.render.session_manager_closed");
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn sessions_created(&self) -> u64 {
        self.sessions_created
    }

    pub fn invalidation_count(&self) -> u64 {
        self.invalidations
    }

    async fn launch(&mut self) -> Result<L::Browser, RenderError> {
        debug!(event = "core.render.session_create_started");
        match self.launcher.launch().await {
            Ok(browser) => {
                self.sessions_created += 1;
                info!(
                    event = "core.render.session_create_completed",
                    sessions_created = self.sessions_created,
                );
                Ok(browser)
            }
            Err(e) => {
                warn!(
                    event = "core.render.session_create_failed",
                    error = %e,
                    error_code = e.error_code(),
                );
                Err(e)
            }
        }
    }
}

async fn quit_quietly<B: Browser>(browser: B) {
    if let Err(e) = browser.quit().await {
        debug!(event = "core.render.session_quit_failed", error = %e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BrowserScript, FakeLauncher};

    #[tokio::test]
    async fn test_first_acquire_launches_once() {
        let script = BrowserScript::new();
        let mut manager = SessionManager::new(FakeLauncher::new(script.clone()));

        manager.acquire_session().await.unwrap();
        manager.acquire_session().await.unwrap();

        assert_eq!(script.launches(), 1);
        assert_eq!(manager.sessions_created(), 1);
        assert!(manager.has_session());
    }

    #[tokio::test]
    async fn test_dead_session_is_replaced() {
        let script = BrowserScript::new();
        let mut manager = SessionManager::new(FakeLauncher::new(script.clone()));

        manager.acquire_session().await.unwrap();
        script.kill_current_session();
        manager.acquire_session().await.unwrap();

        assert_eq!(script.launches(), 2);
        assert_eq!(script.quits(), 1);
        assert_eq!(script.max_live_sessions(), 1);
    }

    #[tokio::test]
    async fn test_launch_failure_is_reported() {
        let script = BrowserScript::new();
        script.fail_next_launches(1);
        let mut manager = SessionManager::new(FakeLauncher::new(script.clone()));

        let err = manager.acquire_session().await.err().unwrap();
        assert!(matches!(err, RenderError::SessionCreateFailed { .. }));
        assert!(!manager.has_session());

        manager.acquire_session().await.unwrap();
        assert_eq!(script.launches(), 2);
    }

    #[tokio::test]
    async fn test_suspect_session_is_discarded_on_next_acquire() {
        let script = BrowserScript::new();
        let mut manager = SessionManager::new(FakeLauncher::new(script.clone()));

        manager.acquire_session().await.unwrap();
        manager.mark_suspect();
        manager.acquire_session().await.unwrap();

        assert_eq!(script.launches(), 2);
        assert_eq!(script.quits(), 1);
        assert_eq!(manager.invalidation_count(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_counts_and_quits() {
        let script = BrowserScript::new();
        let mut manager = SessionManager::new(FakeLauncher::new(script.clone()));

        manager.acquire_session().await.unwrap();
        manager.invalidate().await;

        assert!(!manager.has_session());
        assert_eq!(manager.invalidation_count(), 1);
        assert_eq!(script.quits(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let script = BrowserScript::new();
        let mut manager = SessionManager::new(FakeLauncher::new(script.clone()));

        manager.acquire_session().await.unwrap();
        manager.close().await;
        manager.close().await;

        assert_eq!(script.quits(), 1);
        assert_eq!(script.shutdowns(), 1);
        assert!(matches!(
            manager.acquire_session().await,
            Err(RenderError::SessionManagerClosed)
        ));
    }
}

use crate::errors::PaperviewError;

/// The rendering engine could not be created, reused or driven.
///
/// Every variant is retryable by recreating the session.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("chromedriver binary not found at '{path}' or on PATH")]
    DriverNotFound { path: String },

    #[error("Failed to spawn chromedriver: {message}")]
    DriverSpawnFailed { message: String },

    #[error("chromedriver did not become ready within {timeout_secs}s")]
    DriverNotReady { timeout_secs: u64 },

    #[error("Failed to create browser session: {message}")]
    SessionCreateFailed { message: String },

    #[error("Browser session is not responding: {message}")]
    SessionDead { message: String },

    #[error("Session manager has been closed")]
    SessionManagerClosed,

    #[error("Navigation to '{url}' failed: {message}")]
    NavigationFailed { url: String, message: String },

    #[error("Screenshot failed: {message}")]
    ScreenshotFailed { message: String },

    #[error("WebDriver command failed ({error}): {message}")]
    WebDriver { error: String, message: String },

    #[error("WebDriver transport error: {message}")]
    Transport { message: String },
}

impl PaperviewError for RenderError {
    fn error_code(&self) -> &'static str {
        match self {
            RenderError::DriverNotFound { .. } => "RENDER_DRIVER_NOT_FOUND",
            RenderError::DriverSpawnFailed { .. } => "RENDER_DRIVER_SPAWN_FAILED",
            RenderError::DriverNotReady { .. } => "RENDER_DRIVER_NOT_READY",
            RenderError::SessionCreateFailed { .. } => "RENDER_SESSION_CREATE_FAILED",
            RenderError::SessionDead { .. } => "RENDER_SESSION_DEAD",
            RenderError::SessionManagerClosed => "RENDER_SESSION_MANAGER_CLOSED",
            RenderError::NavigationFailed { .. } => "RENDER_NAVIGATION_FAILED",
            RenderError::ScreenshotFailed { .. } => "RENDER_SCREENSHOT_FAILED",
            RenderError::WebDriver { .. } => "RENDER_WEBDRIVER_ERROR",
            RenderError::Transport { .. } => "RENDER_TRANSPORT_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, RenderError::DriverNotFound { .. })
    }
}

impl From<reqwest::Error> for RenderError {
    fn from(error: reqwest::Error) -> Self {
        RenderError::Transport {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_not_found_is_user_error() {
        let error = RenderError::DriverNotFound {
            path: "/usr/bin/chromedriver".to_string(),
        };
        assert!(error.is_user_error());
        assert_eq!(error.error_code(), "RENDER_DRIVER_NOT_FOUND");
    }

    #[test]
    fn test_webdriver_error_display() {
        let error = RenderError::WebDriver {
            error: "invalid session id".to_string(),
            message: "session deleted".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "WebDriver command failed (invalid session id): session deleted"
        );
        assert!(!error.is_user_error());
    }
}

use crate::errors::PaperviewError;
use crate::render::RenderError;

/// A capture attempt failed. Every variant is retryable.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Rendering unavailable: {source}")]
    RenderingUnavailable {
        #[from]
        source: RenderError,
    },

    #[error("Navigation to '{url}' timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("Failed to decode screenshot: {message}")]
    DecodeFailed { message: String },
}

impl PaperviewError for CaptureError {
    fn error_code(&self) -> &'static str {
        match self {
            CaptureError::RenderingUnavailable { .. } => "CAPTURE_RENDERING_UNAVAILABLE",
            CaptureError::NavigationTimeout { .. } => "CAPTURE_NAVIGATION_TIMEOUT",
            CaptureError::DecodeFailed { .. } => "CAPTURE_DECODE_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_converts() {
        let error: CaptureError = RenderError::ScreenshotFailed {
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(error.error_code(), "CAPTURE_RENDERING_UNAVAILABLE");
        assert_eq!(
            error.to_string(),
            "Rendering unavailable: Screenshot failed: boom"
        );
    }
}

//! Page capture: URL in, panel-sized grayscale bitmap out.

pub mod errors;

use std::net::IpAddr;
use std::time::Duration;

use image::imageops::FilterType;
use image::{GrayImage, ImageFormat};
use tracing::{debug, warn};

use crate::config::{ContentConfig, PaperviewConfig};
use crate::errors::PaperviewError;
use crate::net::AddressSource;
use crate::render::{Browser, BrowserLauncher, SessionManager};

pub use errors::CaptureError;

/// Rendered page URL: `https://<host>/<path>?ip=<ip>[&second=true]`.
pub fn build_target_url(content: &ContentConfig, ip: IpAddr, second_view: bool) -> String {
    let path = content.path.trim_start_matches('/');
    let mut url = format!("https://{}/{}?ip={}", content.host, path, ip);
    if second_view {
        url.push_str("&second=true");
    }
    url
}

/// Decode a PNG screenshot to 8-bit grayscale at exactly `width` x `height`.
///
/// # Errors
///
/// Returns [`CaptureError::DecodeFailed`] for anything that is not a PNG.
pub fn decode_to_panel(png: &[u8], width: u32, height: u32) -> Result<GrayImage, CaptureError> {
    let decoded = image::load_from_memory_with_format(png, ImageFormat::Png).map_err(|e| {
        CaptureError::DecodeFailed {
            message: e.to_string(),
        }
    })?;
    let gray = decoded.into_luma8();
    if gray.dimensions() == (width, height) {
        return Ok(gray);
    }
    Ok(image::imageops::resize(
        &gray,
        width,
        height,
        FilterType::Triangle,
    ))
}

/// Navigates the managed session and screenshots the result.
#[derive(Debug, Clone)]
pub struct CapturePipeline {
    width: u32,
    height: u32,
    page_load_timeout: Duration,
}

impl CapturePipeline {
    pub fn new(width: u32, height: u32, page_load_timeout: Duration) -> Self {
        Self {
            width,
            height,
            page_load_timeout,
        }
    }

    /// Capture `url` once.
    ///
    /// On failure the session is marked suspect so the next acquire starts
    /// from a fresh one.
    pub async fn capture<L: BrowserLauncher>(
        &self,
        sessions: &mut SessionManager<L>,
        url: &str,
    ) -> Result<GrayImage, CaptureError> {
        let result = self.try_capture(sessions, url).await;
        if let Err(e) = &result {
            warn!(
                event = "core.capture.capture_failed",
                url = url,
                error = %e,
                error_code = e.error_code(),
            );
            sessions.mark_suspect();
        }
        result
    }

    async fn try_capture<L: BrowserLauncher>(
        &self,
        sessions: &mut SessionManager<L>,
        url: &str,
    ) -> Result<GrayImage, CaptureError> {
        debug!(event = "core.capture.capture_started", url = url);
        let browser = sessions.acquire_session().await?;

        tokio::time::timeout(self.page_load_timeout, browser.navigate(url))
            .await
            .map_err(|_| CaptureError::NavigationTimeout {
                url: url.to_string(),
                timeout_secs: self.page_load_timeout.as_secs(),
            })??;

        let png = browser.screenshot_png().await?;
        let bitmap = decode_to_panel(&png, self.width, self.height)?;
        debug!(
            event = "core.capture.capture_completed",
            url = url,
            png_bytes = png.len(),
        );
        Ok(bitmap)
    }
}

/// Render the primary view once in a fresh session, then close it.
///
/// Used by one-shot tooling; the daemon goes through the orchestrator.
pub async fn capture_once<L, A>(
    config: &PaperviewConfig,
    launcher: L,
    address: &A,
) -> Result<GrayImage, CaptureError>
where
    L: BrowserLauncher,
    A: AddressSource,
{
    let pipeline = CapturePipeline::new(
        config.display.width,
        config.display.height,
        config.renderer.page_load_timeout(),
    );
    let url = build_target_url(&config.content, address.local_address(), false);
    let mut sessions = SessionManager::new(launcher);
    let result = pipeline.capture(&mut sessions, &url).await;
    sessions.close().await;
    result
}

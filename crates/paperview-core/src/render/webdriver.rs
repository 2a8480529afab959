//! Minimal W3C WebDriver client.
//!
//! Only the handful of commands the capture pipeline needs: new session,
//! get/set URL, screenshot, delete session.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::RendererConfig;
use crate::render::{Browser, RenderError};

/// Capabilities for a headless, fixed-size, TLS-tolerant Chrome session.
pub fn session_capabilities(config: &RendererConfig) -> Value {
    let page_load_ms = config.page_load_timeout().as_millis() as u64;
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "acceptInsecureCerts": true,
                "timeouts": { "pageLoad": page_load_ms },
                "goog:chromeOptions": {
                    "args": [
                        "--headless",
                        "--disable-gpu",
                        "--no-sandbox",
                        format!("--window-size={},{}", config.window_width, config.window_height),
                        "--ignore-certificate-errors",
                    ]
                }
            }
        }
    })
}

/// Pull `value` out of a WebDriver response envelope.
///
/// Error responses carry `{"value": {"error": ..., "message": ...}}` with a
/// non-success status.
pub fn extract_value(status: StatusCode, body: Value) -> Result<Value, RenderError> {
    let mut body = body;
    let value = body
        .get_mut("value")
        .map(Value::take)
        .unwrap_or(Value::Null);

    if status.is_success() {
        return Ok(value);
    }

    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Err(RenderError::WebDriver {
        error: format!("{} {}", status.as_u16(), error),
        message,
    })
}

/// A live WebDriver session.
#[derive(Debug)]
pub struct WebDriverSession {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl WebDriverSession {
    /// Open a new session on the driver listening at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::SessionCreateFailed`] if the driver rejects the
    /// request or is unreachable.
    pub async fn create(
        client: reqwest::Client,
        base_url: impl Into<String>,
        config: &RendererConfig,
    ) -> Result<Self, RenderError> {
        let base_url = base_url.into();
        let response = client
            .post(format!("{base_url}/session"))
            .json(&session_capabilities(config))
            .send()
            .await
            .map_err(|e| RenderError::SessionCreateFailed {
                message: e.to_string(),
            })?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| RenderError::SessionCreateFailed {
                message: e.to_string(),
            })?;

        let value = extract_value(status, body).map_err(|e| RenderError::SessionCreateFailed {
            message: e.to_string(),
        })?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| RenderError::SessionCreateFailed {
                message: "response carried no sessionId".to_string(),
            })?
            .to_string();

        debug!(event = "core.render.webdriver_session_opened", session_id = %session_id);

        Ok(Self {
            client,
            base_url,
            session_id,
        })
    }

    pub fn id(&self) -> &str {
        &self.session_id
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, RenderError> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await?;
        extract_value(status, body)
    }
}

impl Browser for WebDriverSession {
    async fn current_url(&self) -> Result<String, RenderError> {
        let value = self
            .command(Method::GET, "/url", None)
            .await
            .map_err(|e| RenderError::SessionDead {
                message: e.to_string(),
            })?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn navigate(&self, url: &str) -> Result<(), RenderError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
            .map_err(|e| RenderError::NavigationFailed {
                url: url.to_string(),
                message: e.to_string(),
            })
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>, RenderError> {
        let value = self
            .command(Method::GET, "/screenshot", None)
            .await
            .map_err(|e| RenderError::ScreenshotFailed {
                message: e.to_string(),
            })?;
        let encoded = value.as_str().ok_or_else(|| RenderError::ScreenshotFailed {
            message: "screenshot value is not a string".to_string(),
        })?;
        BASE64
            .decode(encoded)
            .map_err(|e| RenderError::ScreenshotFailed {
                message: format!("invalid base64: {e}"),
            })
    }

    async fn quit(self) -> Result<(), RenderError> {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        let response = self.client.delete(url).send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        extract_value(status, body)?;
        debug!(event = "core.render.webdriver_session_closed", session_id = %self.session_id);
        Ok(())
    }
}

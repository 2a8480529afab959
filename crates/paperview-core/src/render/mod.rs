//! Headless browser rendering.
//!
//! [`SessionManager`] owns at most one live browser session and hands out
//! borrows of it. Everything that talks to the engine goes through it; the
//! concrete engine is chromedriver speaking W3C WebDriver
//! ([`ChromeDriverLauncher`]).

pub mod chromedriver;
pub mod errors;
pub mod session;
pub mod webdriver;

use std::future::Future;

pub use chromedriver::ChromeDriverLauncher;
pub use errors::RenderError;
pub use session::SessionManager;
pub use webdriver::WebDriverSession;

/// One live browser session.
pub trait Browser: Send + Sync {
    /// URL of the current page. Used as the liveness probe.
    fn current_url(&self) -> impl Future<Output = Result<String, RenderError>> + Send;

    /// Load `url`, returning once the page has loaded or the page-load
    /// timeout fired.
    fn navigate(&self, url: &str) -> impl Future<Output = Result<(), RenderError>> + Send;

    /// PNG screenshot of the viewport.
    fn screenshot_png(&self) -> impl Future<Output = Result<Vec<u8>, RenderError>> + Send;

    /// End the session.
    fn quit(self) -> impl Future<Output = Result<(), RenderError>> + Send;
}

/// Creates browser sessions and owns whatever process backs them.
pub trait BrowserLauncher: Send + Sync {
    type Browser: Browser;

    fn launch(&self) -> impl Future<Output = Result<Self::Browser, RenderError>> + Send;

    /// Release the engine process. Called once, after the last session quit.
    fn shutdown(&self) -> impl Future<Output = ()> + Send;
}

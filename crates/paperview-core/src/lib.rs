//! paperview-core: refresh engine for a web page mirrored onto e-paper
//!
//! Renders a page through a headless browser, converts the screenshot to a
//! 1-bit frame and drives a Waveshare 7.5" V2 panel with full and partial
//! refreshes on a fixed cadence.
//!
//! # Main Entry Points
//!
//! - [`refresh`] - The orchestrator: scheduling, retries, teardown
//! - [`render`] - Browser sessions over WebDriver
//! - [`display`] - Panel driver and display state machine
//! - [`capture`] - Screenshot to panel bitmap
//! - [`config`] - Configuration management

pub mod capture;
pub mod config;
pub mod diagnostics;
pub mod display;
pub mod errors;
pub mod events;
pub mod health;
pub mod logging;
pub mod net;
pub mod refresh;
pub mod render;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types at crate root for convenience
pub use capture::{CaptureError, CapturePipeline};
pub use config::{PaperviewConfig, PanelMode};
pub use display::{DisplayAdapter, DisplayError, DisplayState, PaintOutcome, PanelDevice};
pub use errors::{ConfigError, PaperviewError, PaperviewResult};
pub use health::{ContentProbe, HttpContentProbe, ProbeError};
pub use net::{AddressSource, RoutedAddressSource, StaticAddress};
pub use refresh::{CycleOutcome, RefreshKind, RefreshOrchestrator};
pub use render::{Browser, BrowserLauncher, ChromeDriverLauncher, RenderError, SessionManager};

// Re-export logging initialization
pub use logging::{LoggingOptions, Verbosity, init_logging};

//! E-paper display: packed frames, the panel driver and the adapter state
//! machine the orchestrator talks to.

pub mod adapter;
pub mod diff;
pub mod epd7in5_v2;
pub mod errors;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod types;

use crate::config::{DisplayConfig, PanelMode};

pub use adapter::DisplayAdapter;
pub use errors::DisplayError;
pub use types::{DisplayState, FrameBuffer, PaintOutcome, Rect};

/// Blocking access to one physical panel.
///
/// Calls may take seconds (a full refresh waits on the BUSY line), so the
/// adapter only invokes them from the blocking pool.
pub trait PanelDevice: Send + 'static {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Reset and configure full-refresh mode.
    fn init(&mut self, mode: PanelMode) -> Result<(), DisplayError>;

    /// Reset and configure partial-refresh mode.
    fn init_partial(&mut self) -> Result<(), DisplayError>;

    /// Blank the whole panel to white.
    fn clear(&mut self) -> Result<(), DisplayError>;

    fn write_full(&mut self, frame: &FrameBuffer) -> Result<(), DisplayError>;

    /// Write packed rows covering `region`. `region.x` and `region.width`
    /// are multiples of 8.
    fn write_partial(&mut self, region: Rect, data: &[u8]) -> Result<(), DisplayError>;

    /// Power down into deep sleep. The next command must be an init.
    fn sleep(&mut self) -> Result<(), DisplayError>;

    /// Give up the underlying bus and lines. Idempotent.
    fn release(&mut self) -> Result<(), DisplayError>;
}

/// Open the configured panel, blank it and power it down.
#[cfg(target_os = "linux")]
pub async fn clear_panel(config: &DisplayConfig) -> Result<(), DisplayError> {
    let panel = linux::open_panel(config)?;
    let mut adapter = DisplayAdapter::new(panel, config.mode);
    adapter.shutdown().await
}

#[cfg(not(target_os = "linux"))]
pub async fn clear_panel(_config: &DisplayConfig) -> Result<(), DisplayError> {
    Err(DisplayError::Unsupported {
        message: "SPI e-paper panels are only supported on Linux".to_string(),
    })
}

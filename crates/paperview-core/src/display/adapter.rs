use std::sync::{Arc, Mutex};

use image::GrayImage;
use tracing::{debug, error, info, warn};

use crate::config::PanelMode;
use crate::display::diff::{extract_region, frame_diff};
use crate::display::{DisplayError, DisplayState, FrameBuffer, PaintOutcome, PanelDevice};
use crate::errors::PaperviewError;

/// Lifecycle wrapper around a [`PanelDevice`].
///
/// Tracks [`DisplayState`] and the reference frame partial paints are
/// diffed against. Any device error moves the adapter to
/// [`DisplayState::Faulted`]; paints are refused until [`init`](Self::init)
/// succeeds again.
pub struct DisplayAdapter<D: PanelDevice> {
    device: Arc<Mutex<D>>,
    mode: PanelMode,
    width: u32,
    height: u32,
    state: DisplayState,
    reference: Option<FrameBuffer>,
    released: bool,
}

impl<D: PanelDevice> DisplayAdapter<D> {
    pub fn new(device: D, mode: PanelMode) -> Self {
        let width = device.width();
        let height = device.height();
        Self {
            device: Arc::new(Mutex::new(device)),
            mode,
            width,
            height,
            state: DisplayState::Uninitialized,
            reference: None,
            released: false,
        }
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn mode(&self) -> PanelMode {
        self.mode
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True once a full paint has landed since the last init.
    pub fn has_reference_frame(&self) -> bool {
        self.reference.is_some()
    }

    /// True when a recovery init must run before the next paint.
    pub fn needs_recovery(&self) -> bool {
        matches!(
            self.state,
            DisplayState::Uninitialized | DisplayState::Faulted
        )
    }

    /// Initialise full-refresh mode and blank the panel.
    ///
    /// Also the recovery path out of [`DisplayState::Faulted`]. Leaves the
    /// panel without a reference frame.
    pub async fn init(&mut self) -> Result<(), DisplayError> {
        let mode = self.mode;
        self.reference = None;
        self.device_op("init", move |device| {
            device.init(mode)?;
            device.clear()
        })
        .await?;
        self.state = DisplayState::Ready;
        info!(event = "core.display.init_completed", mode = %mode);
        Ok(())
    }

    /// Full refresh: init, clear, write the whole frame, sleep.
    ///
    /// # Errors
    ///
    /// [`DisplayError::Faulted`] if the adapter needs recovery first; any
    /// device error (which also faults the adapter).
    pub async fn full_paint(&mut self, bitmap: &GrayImage) -> Result<PaintOutcome, DisplayError> {
        self.ensure_paintable()?;
        let frame = FrameBuffer::from_gray(bitmap, self.width, self.height)?;
        self.paint_full_frame(frame).await?;
        Ok(PaintOutcome::Full)
    }

    /// Partial refresh of the region that changed since the reference frame.
    ///
    /// Without a reference frame the request is upgraded to a full paint.
    pub async fn partial_paint(
        &mut self,
        bitmap: &GrayImage,
    ) -> Result<PaintOutcome, DisplayError> {
        self.ensure_paintable()?;
        let frame = FrameBuffer::from_gray(bitmap, self.width, self.height)?;

        let Some(reference) = self.reference.as_ref() else {
            warn!(event = "core.display.partial_upgraded", reason = "no_reference_frame");
            self.paint_full_frame(frame).await?;
            return Ok(PaintOutcome::UpgradedToFull);
        };

        let Some(diff) = frame_diff(&frame, reference) else {
            debug!(event = "core.display.partial_skipped", reason = "unchanged");
            return Ok(PaintOutcome::Unchanged);
        };

        let region = diff.to_rect();
        let data = extract_region(frame.as_bytes(), frame.width_bytes(), diff);
        debug!(
            event = "core.display.partial_started",
            region = %region,
            changed_bytes = diff.changed,
        );
        self.device_op("partial_paint", move |device| {
            device.init_partial()?;
            device.write_partial(region, &data)?;
            device.sleep()
        })
        .await?;

        self.reference = Some(frame);
        self.state = DisplayState::Ready;
        info!(event = "core.display.partial_completed", region = %region);
        Ok(PaintOutcome::Partial { region })
    }

    /// Blank the panel and put it to sleep.
    ///
    /// Allowed from any state; a successful clear leaves the adapter ready
    /// without a reference frame.
    pub async fn clear(&mut self) -> Result<(), DisplayError> {
        if self.released {
            return Err(DisplayError::Released);
        }
        let mode = self.mode;
        self.reference = None;
        self.device_op("clear", move |device| {
            device.init(mode)?;
            device.clear()?;
            device.sleep()
        })
        .await?;
        self.state = DisplayState::Ready;
        info!(event = "core.display.clear_completed");
        Ok(())
    }

    /// Clear, sleep and release the device. Idempotent.
    ///
    /// The device is released even if the final clear fails.
    pub async fn shutdown(&mut self) -> Result<(), DisplayError> {
        if self.released {
            return Ok(());
        }
        let mode = self.mode;
        let result = self
            .device_op("shutdown", move |device| {
                let blanked = device
                    .init(mode)
                    .and_then(|()| device.clear())
                    .and_then(|()| device.sleep());
                let released = device.release();
                blanked.and(released)
            })
            .await;

        self.released = true;
        self.reference = None;
        self.state = DisplayState::Uninitialized;
        info!(event = "core.display.shutdown_completed", success = result.is_ok());
        result
    }

    fn ensure_paintable(&self) -> Result<(), DisplayError> {
        if self.released {
            return Err(DisplayError::Released);
        }
        if self.state == DisplayState::Faulted {
            return Err(DisplayError::Faulted);
        }
        Ok(())
    }

    async fn paint_full_frame(&mut self, frame: FrameBuffer) -> Result<(), DisplayError> {
        let mode = self.mode;
        debug!(event = "core.display.full_started");
        let frame = self
            .device_op("full_paint", move |device| {
                device.init(mode)?;
                device.clear()?;
                device.write_full(&frame)?;
                device.sleep()?;
                Ok(frame)
            })
            .await?;

        self.reference = Some(frame);
        self.state = DisplayState::Ready;
        info!(event = "core.display.full_completed");
        Ok(())
    }

    /// Run `op` on the blocking pool. Errors fault the adapter.
    async fn device_op<T, F>(&mut self, name: &'static str, op: F) -> Result<T, DisplayError>
    where
        T: Send + 'static,
        F: FnOnce(&mut D) -> Result<T, DisplayError> + Send + 'static,
    {
        let device = Arc::clone(&self.device);
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = device.lock().map_err(|_| DisplayError::WorkerFailed {
                message: "device mutex poisoned".to_string(),
            })?;
            op(&mut *guard)
        })
        .await
        .map_err(|e| DisplayError::WorkerFailed {
            message: e.to_string(),
        })
        .and_then(|inner| inner);

        if let Err(e) = &result {
            self.state = DisplayState::Faulted;
            self.reference = None;
            error!(
                event = "core.display.operation_failed",
                operation = name,
                error = %e,
                error_code = e.error_code(),
            );
        }
        result
    }
}

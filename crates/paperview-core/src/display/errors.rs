use crate::errors::PaperviewError;

/// Display hardware and adapter failures.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("Failed to open display device '{device}': {message}")]
    DeviceOpen { device: String, message: String },

    #[error("Display platform not supported: {message}")]
    Unsupported { message: String },

    #[error("SPI transfer failed: {message}")]
    Spi { message: String },

    #[error("GPIO operation failed: {message}")]
    Gpio { message: String },

    #[error("Panel stayed busy for more than {waited_ms}ms")]
    BusyTimeout { waited_ms: u64 },

    #[error("Bitmap is {actual_width}x{actual_height}, panel expects {width}x{height}")]
    BitmapSizeMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Display is faulted; re-initialise before painting")]
    Faulted,

    #[error("Display device has been released")]
    Released,

    #[error("Display worker failed: {message}")]
    WorkerFailed { message: String },
}

impl PaperviewError for DisplayError {
    fn error_code(&self) -> &'static str {
        match self {
            DisplayError::DeviceOpen { .. } => "DISPLAY_DEVICE_OPEN_FAILED",
            DisplayError::Unsupported { .. } => "DISPLAY_UNSUPPORTED",
            DisplayError::Spi { .. } => "DISPLAY_SPI_ERROR",
            DisplayError::Gpio { .. } => "DISPLAY_GPIO_ERROR",
            DisplayError::BusyTimeout { .. } => "DISPLAY_BUSY_TIMEOUT",
            DisplayError::BitmapSizeMismatch { .. } => "DISPLAY_BITMAP_SIZE_MISMATCH",
            DisplayError::Faulted => "DISPLAY_FAULTED",
            DisplayError::Released => "DISPLAY_RELEASED",
            DisplayError::WorkerFailed { .. } => "DISPLAY_WORKER_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            DisplayError::DeviceOpen { .. } | DisplayError::Unsupported { .. }
        )
    }
}

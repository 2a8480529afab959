use std::fmt;

use image::GrayImage;

use crate::display::DisplayError;

/// Luma values at or above this are white.
pub const WHITE_THRESHOLD: u8 = 128;

/// Adapter lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    Uninitialized,
    Ready,
    Faulted,
}

impl DisplayState {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayState::Uninitialized => "uninitialized",
            DisplayState::Ready => "ready",
            DisplayState::Faulted => "faulted",
        }
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel rectangle. `x` and `width` are multiples of 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// What a paint request actually did to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOutcome {
    Full,
    Partial { region: Rect },
    /// Partial paint requested without a reference frame; a full paint ran.
    UpgradedToFull,
    /// Nothing changed since the reference frame; the panel was not touched.
    Unchanged,
}

impl PaintOutcome {
    /// True when the whole panel was redrawn.
    pub fn was_full(self) -> bool {
        matches!(self, PaintOutcome::Full | PaintOutcome::UpgradedToFull)
    }
}

/// 1-bit-per-pixel frame, rows packed MSB first, `1` = white.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl FrameBuffer {
    /// All-white frame.
    pub fn blank(width: u32, height: u32) -> Self {
        let len = width.div_ceil(8) as usize * height as usize;
        Self {
            width,
            height,
            bytes: vec![0xFF; len],
        }
    }

    /// Threshold and pack a grayscale image that matches the panel size.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError::BitmapSizeMismatch`] if the image is not
    /// exactly `width` x `height`.
    pub fn from_gray(image: &GrayImage, width: u32, height: u32) -> Result<Self, DisplayError> {
        if image.width() != width || image.height() != height {
            return Err(DisplayError::BitmapSizeMismatch {
                width,
                height,
                actual_width: image.width(),
                actual_height: image.height(),
            });
        }

        let width_bytes = width.div_ceil(8) as usize;
        let mut bytes = vec![0u8; width_bytes * height as usize];
        for (x, y, pixel) in image.enumerate_pixels() {
            if pixel.0[0] >= WHITE_THRESHOLD {
                let index = y as usize * width_bytes + (x / 8) as usize;
                bytes[index] |= 0x80 >> (x % 8);
            }
        }
        // Padding bits past `width` stay white.
        if width % 8 != 0 {
            let pad_mask = 0xFFu8 >> (width % 8);
            for row in bytes.chunks_mut(width_bytes) {
                if let Some(last) = row.last_mut() {
                    *last |= pad_mask;
                }
            }
        }

        Ok(Self {
            width,
            height,
            bytes,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width_bytes(&self) -> usize {
        self.width.div_ceil(8) as usize
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

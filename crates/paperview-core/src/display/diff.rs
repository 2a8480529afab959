//! Changed-region detection between two packed frames.
//!
//! Works in byte columns, so every region is 8-pixel aligned horizontally,
//! which is what the controller's partial window requires.

use crate::display::types::{FrameBuffer, Rect};

/// Bounding box of changed bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffRegion {
    pub min_x_byte: usize,
    pub max_x_byte: usize,
    pub min_y: usize,
    pub max_y: usize,
    pub changed: usize,
}

impl DiffRegion {
    pub fn width_bytes(self) -> usize {
        self.max_x_byte.saturating_sub(self.min_x_byte) + 1
    }

    pub fn height(self) -> usize {
        self.max_y.saturating_sub(self.min_y) + 1
    }

    pub fn byte_count(self) -> usize {
        self.width_bytes() * self.height()
    }

    pub fn to_rect(self) -> Rect {
        Rect {
            x: (self.min_x_byte * 8) as u32,
            y: self.min_y as u32,
            width: (self.width_bytes() * 8) as u32,
            height: self.height() as u32,
        }
    }
}

/// Bounding box of all bytes that differ. `None` when the buffers are equal
/// or their sizes disagree with the geometry.
pub fn compute_diff_region(
    current: &[u8],
    last: &[u8],
    width_bytes: usize,
    height: usize,
) -> Option<DiffRegion> {
    let expected_len = width_bytes * height;
    if width_bytes == 0 || current.len() != expected_len || last.len() != expected_len {
        return None;
    }

    let mut region: Option<DiffRegion> = None;
    for (i, _) in current
        .iter()
        .zip(last.iter())
        .enumerate()
        .filter(|(_, (new_b, old_b))| new_b != old_b)
    {
        let y = i / width_bytes;
        let x = i % width_bytes;
        let r = region.get_or_insert(DiffRegion {
            min_x_byte: x,
            max_x_byte: x,
            min_y: y,
            max_y: y,
            changed: 0,
        });
        r.min_x_byte = r.min_x_byte.min(x);
        r.max_x_byte = r.max_x_byte.max(x);
        r.min_y = r.min_y.min(y);
        r.max_y = r.max_y.max(y);
        r.changed += 1;
    }
    region
}

/// Region of `next` that differs from `reference`.
pub fn frame_diff(next: &FrameBuffer, reference: &FrameBuffer) -> Option<DiffRegion> {
    if next.width() != reference.width() || next.height() != reference.height() {
        return None;
    }
    compute_diff_region(
        next.as_bytes(),
        reference.as_bytes(),
        next.width_bytes(),
        next.height() as usize,
    )
}

/// Copy the bytes of `region` out of a full frame, row by row.
pub fn extract_region(source: &[u8], width_bytes: usize, region: DiffRegion) -> Vec<u8> {
    let region_width = region.width_bytes();
    let mut out = Vec::with_capacity(region.byte_count());
    for row in 0..region.height() {
        let start = (region.min_y + row) * width_bytes + region.min_x_byte;
        out.extend_from_slice(&source[start..start + region_width]);
    }
    out
}

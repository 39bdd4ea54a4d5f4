//! Rendering of a grid into an NV12 frame.
//!
//! NV12 layout: a full-resolution luma plane (one byte per pixel) followed
//! by an interleaved half-resolution chroma plane (`width * height / 2`
//! bytes). Only the luma plane changes between frames; chroma is filled
//! with the neutral value once at allocation so the picture is greyscale.

use super::Grid;

/// Luma value of a live cell.
pub const ALIVE_LUMA: u8 = 255;
/// Luma value of a dead cell.
pub const DEAD_LUMA: u8 = 0;
/// Neutral chroma value (no colour).
pub const NEUTRAL_CHROMA: u8 = 128;

/// A reusable planar NV12 frame buffer.
#[derive(Debug, Clone)]
pub struct Frame {
    width: usize,
    height: usize,
    luma: Vec<u8>,
    chroma: Vec<u8>,
}

impl Frame {
    /// Allocate a frame with a black luma plane and neutral chroma.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(
            width % 2 == 0 && height % 2 == 0,
            "NV12 frames need even dimensions"
        );
        Self {
            width,
            height,
            luma: vec![DEAD_LUMA; width * height],
            chroma: vec![NEUTRAL_CHROMA; width * height / 2],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Luma plane, row-major.
    #[inline]
    pub fn luma(&self) -> &[u8] {
        &self.luma
    }

    /// Interleaved chroma plane.
    #[inline]
    pub fn chroma(&self) -> &[u8] {
        &self.chroma
    }

    /// Both planes in wire order.
    #[inline]
    pub fn planes(&self) -> [&[u8]; 2] {
        [&self.luma, &self.chroma]
    }

    /// Total size of one frame in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.luma.len() + self.chroma.len()
    }

    /// Size in bytes of an NV12 frame of the given dimensions.
    #[inline]
    pub fn byte_len_for(width: usize, height: usize) -> usize {
        width * height * 3 / 2
    }
}

/// Draws each cell as a solid `cell_size` x `cell_size` block.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    cell_size: usize,
}

impl Renderer {
    pub fn new(cell_size: usize) -> Self {
        assert!(cell_size > 0, "cell size must be non-zero");
        Self { cell_size }
    }

    /// Overwrite the whole luma plane of `frame` from `grid`.
    pub fn render(&self, grid: &Grid, frame: &mut Frame) {
        debug_assert_eq!(grid.width() * self.cell_size, frame.width);
        debug_assert_eq!(grid.height() * self.cell_size, frame.height);

        let cell_size = self.cell_size;
        for (y, row) in frame.luma.chunks_exact_mut(frame.width).enumerate() {
            let cy = y / cell_size;
            for (cx, block) in row.chunks_exact_mut(cell_size).enumerate() {
                let value = if grid.get(cx, cy) { ALIVE_LUMA } else { DEAD_LUMA };
                block.fill(value);
            }
        }
    }
}

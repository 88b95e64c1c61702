//! Window structure for block-wise raster reads
//!
//! A window is a rectangular area of a raster in pixel coordinates, where
//! (0,0) is the top-left pixel. [`WindowIter`] lazily enumerates the grid
//! of windows that tiles a raster without gaps or overlaps.

use std::fmt;

/// Rectangular pixel area of a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Row of the top edge (pixels from top)
    pub row_offset: u64,
    /// Column of the left edge (pixels from left)
    pub col_offset: u64,
    /// Height of the window in pixels
    pub height: u64,
    /// Width of the window in pixels
    pub width: u64,
}

impl Window {
    pub fn new(row_offset: u64, col_offset: u64, height: u64, width: u64) -> Self {
        Window { row_offset, col_offset, height, width }
    }

    /// Row immediately below the window
    pub fn end_row(&self) -> u64 {
        self.row_offset + self.height
    }

    /// Column immediately right of the window
    pub fn end_col(&self) -> u64 {
        self.col_offset + self.width
    }

    /// Number of pixels covered
    pub fn pixel_count(&self) -> u64 {
        self.height * self.width
    }

    /// Whether the window is non-empty and fits in a `width x height` raster
    pub fn fits_within(&self, width: u64, height: u64) -> bool {
        self.height > 0 && self.width > 0 && self.end_row() <= height && self.end_col() <= width
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[rows {}..{}, cols {}..{}]",
               self.row_offset, self.end_row(), self.col_offset, self.end_col())
    }
}

/// Row-major enumeration of a block grid over a raster
///
/// Edge windows are clipped to the raster extent.
#[derive(Debug, Clone)]
pub struct WindowIter {
    raster_width: u64,
    raster_height: u64,
    block_width: u64,
    block_height: u64,
    next_row: u64,
    next_col: u64,
}

impl WindowIter {
    /// Grid of `block_width x block_height` blocks over the raster
    ///
    /// Zero block dimensions are treated as 1.
    pub fn new(raster_width: u64, raster_height: u64, block_width: u64, block_height: u64) -> Self {
        WindowIter {
            raster_width,
            raster_height,
            block_width: block_width.max(1),
            block_height: block_height.max(1),
            next_row: 0,
            next_col: 0,
        }
    }

    /// Block dimensions `(width, height)` of the grid
    pub fn block_size(&self) -> (u64, u64) {
        (self.block_width, self.block_height)
    }

    fn remaining(&self) -> u64 {
        if self.raster_width == 0 || self.next_row >= self.raster_height {
            return 0;
        }
        let across = self.raster_width.div_ceil(self.block_width);
        let rows_left = (self.raster_height - self.next_row).div_ceil(self.block_height);
        let cols_done = self.next_col / self.block_width;
        rows_left * across - cols_done
    }
}

impl Iterator for WindowIter {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.raster_width == 0 || self.next_row >= self.raster_height {
            return None;
        }

        let window = Window::new(
            self.next_row,
            self.next_col,
            self.block_height.min(self.raster_height - self.next_row),
            self.block_width.min(self.raster_width - self.next_col),
        );

        self.next_col += self.block_width;
        if self.next_col >= self.raster_width {
            self.next_col = 0;
            self.next_row += self.block_height;
        }

        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining() as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WindowIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_the_raster_without_gaps_or_overlaps() {
        let (width, height) = (10u64, 7u64);
        let mut hits = vec![0u8; (width * height) as usize];

        for window in WindowIter::new(width, height, 4, 3) {
            assert!(window.fits_within(width, height));
            for row in window.row_offset..window.end_row() {
                for col in window.col_offset..window.end_col() {
                    hits[(row * width + col) as usize] += 1;
                }
            }
        }

        assert!(hits.iter().all(|&count| count == 1));
    }

    #[test]
    fn enumerates_row_major_and_clips_edges() {
        let windows: Vec<Window> = WindowIter::new(5, 3, 4, 2).collect();
        assert_eq!(windows, vec![
            Window::new(0, 0, 2, 4),
            Window::new(0, 4, 2, 1),
            Window::new(2, 0, 1, 4),
            Window::new(2, 4, 1, 1),
        ]);
    }

    #[test]
    fn reports_exact_length_while_consuming() {
        let mut windows = WindowIter::new(2048, 1500, 1024, 1024);
        assert_eq!(windows.len(), 4);
        windows.next();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows.by_ref().count(), 3);
        assert_eq!(windows.len(), 0);
    }

    #[test]
    fn single_block_when_raster_is_smaller_than_block() {
        let windows: Vec<Window> = WindowIter::new(3, 2, 1024, 1024).collect();
        assert_eq!(windows, vec![Window::new(0, 0, 2, 3)]);
    }

    #[test]
    fn empty_raster_has_no_windows() {
        assert_eq!(WindowIter::new(0, 5, 2, 2).count(), 0);
        assert_eq!(WindowIter::new(5, 0, 2, 2).count(), 0);
    }
}

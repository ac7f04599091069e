//! # Software Rasterizer
//!
//! Turns a decoded frame into ARGB8888 pixels. Used by the headless backend,
//! and the reference for what a display backend is expected to draw.

use ege_core::{Command, FrameBuffer, Rect};

use crate::error::{BackendError, BackendResult};

/// An ARGB8888 pixel surface, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Canvas {
    /// Creates a black canvas.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidSurface`] if either side is zero, or if
    /// either side exceeds `i32::MAX` (rect math is done in `i32`).
    pub fn new(width: usize, height: usize) -> BackendResult<Self> {
        let invalid = BackendError::InvalidSurface { width, height };
        if width == 0 || height == 0 || i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(invalid);
        }
        let len = width.checked_mul(height).ok_or(invalid)?;

        Ok(Self {
            width,
            height,
            pixels: vec![0; len],
        })
    }

    /// Width in pixels.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// All pixels, row-major.
    #[inline]
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// The pixel at (`x`, `y`), or `None` outside the canvas.
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Fills every pixel with `color`.
    pub fn clear(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Fills `rect`, clipped to the canvas. Empty or negative sizes draw nothing.
    pub fn fill_rect(&mut self, rect: Rect, color: u32) {
        let Some((x0, x1)) = clip_span(rect.x, rect.w, self.width) else {
            return;
        };
        let Some((y0, y1)) = clip_span(rect.y, rect.h, self.height) else {
            return;
        };

        for row in self.pixels.chunks_exact_mut(self.width).take(y1).skip(y0) {
            row[x0..x1].fill(color);
        }
    }

    /// Applies one command.
    pub fn apply(&mut self, command: &Command) {
        match *command {
            Command::Clear { color } => self.clear(color),
            Command::Rect { color, rect, .. } => self.fill_rect(rect, color),
        }
    }

    /// Draws a whole frame, starting from black.
    ///
    /// Commands are applied in order; layers are not reordered.
    pub fn draw<const MAX: usize>(&mut self, frame: &FrameBuffer<MAX>) {
        self.clear(0);
        for command in frame {
            self.apply(command);
        }
    }
}

/// Clips `[start, start + len)` to `[0, limit)`.
#[allow(clippy::cast_sign_loss)]
fn clip_span(start: i16, len: i16, limit: usize) -> Option<(usize, usize)> {
    let limit = i32::try_from(limit).unwrap_or(i32::MAX);
    let lo = i32::from(start).max(0);
    let hi = (i32::from(start) + i32::from(len)).min(limit);
    (lo < hi).then_some((lo as usize, hi as usize))
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(canvas: &Canvas, color: u32) -> usize {
        canvas.pixels().iter().filter(|&&p| p == color).count()
    }

    #[test]
    fn test_invalid_surface() {
        assert_eq!(
            Canvas::new(0, 10),
            Err(BackendError::InvalidSurface { width: 0, height: 10 })
        );
        assert!(Canvas::new(10, 0).is_err());
    }

    #[test]
    fn test_clear_then_rect() {
        let mut canvas = Canvas::new(8, 8).unwrap();
        let mut frame: FrameBuffer<4> = FrameBuffer::new();
        frame.push(Command::Clear { color: 0xFF00_0000 });
        frame.push(Command::rect(0, 0xFFFF_0000, 2, 2, 3, 2));

        canvas.draw(&frame);

        assert_eq!(count(&canvas, 0xFFFF_0000), 6);
        assert_eq!(count(&canvas, 0xFF00_0000), 64 - 6);
        assert_eq!(canvas.pixel(2, 2), Some(0xFFFF_0000));
        assert_eq!(canvas.pixel(4, 3), Some(0xFFFF_0000));
        assert_eq!(canvas.pixel(5, 3), Some(0xFF00_0000));
        assert_eq!(canvas.pixel(8, 0), None);
    }

    #[test]
    fn test_rect_is_clipped() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        canvas.fill_rect(Rect::new(-2, -2, 4, 4), 7);
        assert_eq!(count(&canvas, 7), 4);

        canvas.clear(0);
        canvas.fill_rect(Rect::new(3, 3, 100, 100), 7);
        assert_eq!(count(&canvas, 7), 1);

        canvas.clear(0);
        canvas.fill_rect(Rect::new(i16::MAX, 0, i16::MAX, 1), 7);
        assert_eq!(count(&canvas, 7), 0);
    }

    #[test]
    fn test_negative_size_draws_nothing() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        canvas.fill_rect(Rect::new(3, 3, -2, -2), 7);
        canvas.fill_rect(Rect::new(1, 1, 0, 2), 7);
        assert_eq!(count(&canvas, 7), 0);
    }

    #[test]
    fn test_draw_starts_from_black() {
        let mut canvas = Canvas::new(2, 2).unwrap();
        canvas.clear(0xFFFF_FFFF);
        canvas.draw(&FrameBuffer::<1>::new());
        assert_eq!(count(&canvas, 0), 4);
    }
}

//! Drawing surface used by the tapestry and the overlays.
//!
//! [`Canvas`] is the small set of primitives the renderer needs. The window
//! draws through [`raster::PixelCanvas`]; tests can implement the trait to
//! record calls instead of rasterizing them.

pub mod font;
pub mod raster;

use crate::frame::Frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::gray(255);
    pub const BLACK: Self = Self::gray(0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn gray(v: u8) -> Self {
        Self::rgb(v, v, v)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Unweighted mean of the three channels.
    pub fn luminance(self) -> f32 {
        (f32::from(self.r) + f32::from(self.g) + f32::from(self.b)) / 3.0
    }
}

/// Where a text position sits relative to the rendered line(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    Center,
}

pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn clear(&mut self, color: Color);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);

    fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, _radius: f32, color: Color) {
        self.fill_rect(x, y, w, h, color);
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, diameter: f32, color: Color);

    fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, weight: f32, color: Color);

    /// Draws `frame` scaled into the `w` x `h` box at `(x, y)`.
    fn image(&mut self, frame: &Frame, x: f32, y: f32, w: f32, h: f32);

    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, anchor: Anchor, color: Color);
}

/// Offsets every primitive drawn through it; `clear` still covers the
/// whole surface.
pub struct Translate<'a> {
    inner: &'a mut dyn Canvas,
    dx: f32,
    dy: f32,
}

impl<'a> Translate<'a> {
    pub fn new(inner: &'a mut dyn Canvas, dx: f32, dy: f32) -> Self {
        Self { inner, dx, dy }
    }
}

impl Canvas for Translate<'_> {
    fn width(&self) -> u32 {
        self.inner.width()
    }

    fn height(&self) -> u32 {
        self.inner.height()
    }

    fn clear(&mut self, color: Color) {
        self.inner.clear(color);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.inner.fill_rect(x + self.dx, y + self.dy, w, h, color);
    }

    fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Color) {
        self.inner
            .fill_rounded_rect(x + self.dx, y + self.dy, w, h, radius, color);
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, diameter: f32, color: Color) {
        self.inner
            .fill_circle(cx + self.dx, cy + self.dy, diameter, color);
    }

    fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, weight: f32, color: Color) {
        self.inner.line(
            x0 + self.dx,
            y0 + self.dy,
            x1 + self.dx,
            y1 + self.dy,
            weight,
            color,
        );
    }

    fn image(&mut self, frame: &Frame, x: f32, y: f32, w: f32, h: f32) {
        self.inner.image(frame, x + self.dx, y + self.dy, w, h);
    }

    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, anchor: Anchor, color: Color) {
        self.inner
            .text(text, x + self.dx, y + self.dy, size, anchor, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::raster::PixelCanvas;

    #[test]
    fn luminance_is_plain_channel_mean() {
        assert_eq!(Color::rgb(30, 60, 90).luminance(), 60.0);
        assert_eq!(Color::gray(128).luminance(), 128.0);
    }

    #[test]
    fn translate_shifts_fills() {
        let mut canvas = PixelCanvas::new(8, 8);
        canvas.clear(Color::BLACK);
        {
            let mut shifted = Translate::new(&mut canvas, 3.0, 2.0);
            shifted.fill_rect(0.0, 0.0, 1.0, 1.0, Color::WHITE);
        }
        assert_eq!(canvas.pixel(3, 2), Some(0xFFFF_FFFF));
        assert_eq!(canvas.pixel(0, 0), Some(0xFF00_0000));
    }
}

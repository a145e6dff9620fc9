use crate::canvas::Color;
use crate::frame::Frame;

/// Returned when the frame carries no pixels at all.
pub const NO_PIXELS: Color = Color::gray(180);
/// Returned when a computed index lands outside the pixel buffer.
pub const OUT_OF_BOUNDS: Color = Color::gray(200);

/// Looks up source colors for canvas positions.
///
/// The frame is letterboxed into the canvas (uniform scale, centered) and
/// canvas coordinates are mapped back through that fit. Positions outside
/// the fitted picture clamp to its nearest edge pixel.
#[derive(Debug, Clone, Copy)]
pub struct PixelSampler<'a> {
    frame: &'a Frame,
    scale: f32,
    origin_x: f32,
    origin_y: f32,
}

impl<'a> PixelSampler<'a> {
    pub fn new(frame: &'a Frame, canvas_w: f32, canvas_h: f32) -> Self {
        let (scale, origin_x, origin_y) = if frame.is_empty() {
            (1.0, 0.0, 0.0)
        } else {
            let iw = frame.width() as f32;
            let ih = frame.height() as f32;
            let scale = (canvas_w / iw).min(canvas_h / ih);
            let scale = if scale.is_finite() && scale > 0.0 {
                scale
            } else {
                1.0
            };
            (
                scale,
                (canvas_w - iw * scale) / 2.0,
                (canvas_h - ih * scale) / 2.0,
            )
        };
        Self {
            frame,
            scale,
            origin_x,
            origin_y,
        }
    }

    pub fn sample(&self, x: f32, y: f32) -> Color {
        if self.frame.is_empty() {
            return NO_PIXELS;
        }
        let w = i64::from(self.frame.width());
        let h = i64::from(self.frame.height());
        let img_x = (((x - self.origin_x) / self.scale).floor() as i64).clamp(0, w - 1);
        let img_y = (((y - self.origin_y) / self.scale).floor() as i64).clamp(0, h - 1);

        let idx = img_y
            .checked_mul(w)
            .and_then(|row| row.checked_add(img_x))
            .and_then(|px| px.checked_mul(4))
            .and_then(|idx| usize::try_from(idx).ok());
        let pixels = self.frame.pixels();
        match idx.and_then(|idx| pixels.get(idx..idx.checked_add(3)?)) {
            Some(px) => Color::rgb(px[0], px[1], px[2]),
            None => OUT_OF_BOUNDS,
        }
    }
}

/// One-off lookup; build a [`PixelSampler`] when sampling many points.
pub fn sample(frame: &Frame, canvas_w: f32, canvas_h: f32, x: f32, y: f32) -> Color {
    PixelSampler::new(frame, canvas_w, canvas_h).sample(x, y)
}

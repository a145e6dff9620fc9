// Raster helpers pass explicit geometry and color arguments to keep
// allocations out of the per-pixel loops.
#![allow(clippy::too_many_arguments)]

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};

use super::{Anchor, Canvas, Color};
use crate::frame::Frame;

/// Software canvas writing `0xAARRGGBB` pixels, the layout softbuffer
/// presents.
pub struct PixelCanvas {
    width: u32,
    height: u32,
    buffer: Vec<u32>,
    font: Option<FontArc>,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            buffer: vec![0xFF00_0000; (width as usize) * (height as usize)],
            font: None,
        }
    }

    /// Text calls are dropped when no font is attached.
    pub fn with_font(mut self, font: Option<FontArc>) -> Self {
        self.font = font;
        self
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.buffer = vec![0xFF00_0000; (width as usize) * (height as usize)];
    }

    pub fn pixels(&self) -> &[u32] {
        &self.buffer
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.buffer.get((y * self.width + x) as usize).copied()
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        if coverage <= 0.0 || color.a == 0 {
            return;
        }
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = (y as u32 * self.width + x as u32) as usize;
        let alpha = (f32::from(color.a) / 255.0 * coverage).clamp(0.0, 1.0);
        let dst = unpack_color(self.buffer[idx]);
        let src = (
            f32::from(color.r) / 255.0,
            f32::from(color.g) / 255.0,
            f32::from(color.b) / 255.0,
        );
        self.buffer[idx] = pack_color(blend(src, dst, alpha));
    }

    fn text_line(&mut self, font: &FontArc, line: &str, left: f32, baseline: f32, scale: PxScale, color: Color) {
        let scaled = font.as_scaled(scale);
        let mut cursor_x = left;
        let mut previous = None;
        for ch in line.chars() {
            if ch.is_control() {
                continue;
            }
            let glyph_id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                cursor_x += scaled.kern(prev, glyph_id);
            }
            let mut glyph = scaled.scaled_glyph(ch);
            glyph.position = point(cursor_x, baseline);
            if let Some(outline) = font.outline_glyph(glyph) {
                let bounds = outline.px_bounds();
                outline.draw(|x, y, coverage| {
                    self.blend_pixel(
                        (bounds.min.x + x as f32).floor() as i32,
                        (bounds.min.y + y as f32).floor() as i32,
                        color,
                        coverage,
                    );
                });
            }
            cursor_x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
    }
}

impl Canvas for PixelCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, color: Color) {
        let packed = pack_color((
            f32::from(color.r) / 255.0,
            f32::from(color.g) / 255.0,
            f32::from(color.b) / 255.0,
        ));
        self.buffer.fill(packed);
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let (x0, x1) = pixel_span(x, x + w);
        let (y0, y1) = pixel_span(y, y + h);
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.width as i32);
        let y1 = y1.min(self.height as i32);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color, 1.0);
            }
        }
    }

    fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Color) {
        if radius <= 0.0 || radius * 2.0 >= w.min(h) {
            self.fill_rect(x, y, w, h, color);
            return;
        }
        self.fill_rect(x + radius, y, w - 2.0 * radius, h, color);
        self.fill_rect(x, y + radius, radius, h - 2.0 * radius, color);
        self.fill_rect(x + w - radius, y + radius, radius, h - 2.0 * radius, color);

        let corners = [
            (x + radius, y + radius, Corner::TopLeft),
            (x + w - radius, y + radius, Corner::TopRight),
            (x + radius, y + h - radius, Corner::BottomLeft),
            (x + w - radius, y + h - radius, Corner::BottomRight),
        ];
        let r = radius.ceil() as i32;
        for (cx, cy, corner) in corners {
            for dy in -r..r {
                for dx in -r..r {
                    let (fx, fy) = (dx as f32 + 0.5, dy as f32 + 0.5);
                    if corner.contains(fx, fy) && fx * fx + fy * fy <= radius * radius {
                        self.blend_pixel(
                            (cx + dx as f32).floor() as i32,
                            (cy + dy as f32).floor() as i32,
                            color,
                            1.0,
                        );
                    }
                }
            }
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, diameter: f32, color: Color) {
        let radius = diameter * 0.5;
        if radius <= 0.0 {
            return;
        }
        let (x0, x1) = pixel_span(cx - radius, cx + radius);
        let (y0, y1) = pixel_span(cy - radius, cy + radius);
        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= radius * radius {
                    self.blend_pixel(px, py, color, 1.0);
                }
            }
        }
    }

    fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, weight: f32, color: Color) {
        let half = (weight * 0.5).max(0.5);
        let (left, right) = pixel_span(x0.min(x1) - half, x0.max(x1) + half);
        let (top, bottom) = pixel_span(y0.min(y1) - half, y0.max(y1) + half);
        for py in top..bottom {
            for px in left..right {
                let d = distance_to_segment(px as f32 + 0.5, py as f32 + 0.5, x0, y0, x1, y1);
                if d <= half {
                    self.blend_pixel(px, py, color, 1.0);
                }
            }
        }
    }

    fn image(&mut self, frame: &Frame, x: f32, y: f32, w: f32, h: f32) {
        if frame.is_empty() || w < 1.0 || h < 1.0 {
            return;
        }
        let (x0, x1) = pixel_span(x, x + w);
        let (y0, y1) = pixel_span(y, y + h);
        let draw_w = (x1 - x0).max(1) as f32;
        let draw_h = (y1 - y0).max(1) as f32;
        for py in y0.max(0)..y1.min(self.height as i32) {
            let sy = (((py - y0) as f32 / draw_h) * frame.height() as f32).floor() as u32;
            for px in x0.max(0)..x1.min(self.width as i32) {
                let sx = (((px - x0) as f32 / draw_w) * frame.width() as f32).floor() as u32;
                if let Some([r, g, b, a]) = frame.pixel(sx, sy) {
                    self.blend_pixel(px, py, Color::rgba(r, g, b, a), 1.0);
                }
            }
        }
    }

    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, anchor: Anchor, color: Color) {
        let Some(font) = self.font.clone() else {
            return;
        };
        let scale = PxScale::from(size);
        let scaled = font.as_scaled(scale);
        let ascent = scaled.ascent();
        let descent = scaled.descent().abs();
        let line_height = ascent + descent + scaled.line_gap();

        let lines: Vec<&str> = text.lines().collect();
        let block_height = line_height * lines.len().saturating_sub(1) as f32 + ascent + descent;
        let top = match anchor {
            Anchor::TopLeft => y,
            Anchor::Center => y - block_height * 0.5,
        };
        for (i, line) in lines.iter().enumerate() {
            let left = match anchor {
                Anchor::TopLeft => x,
                Anchor::Center => x - measure_text(&font, line, scale) * 0.5,
            };
            let baseline = top + ascent + line_height * i as f32;
            self.text_line(&font, line, left, baseline, scale, color);
        }
    }
}

#[derive(Clone, Copy)]
enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    fn contains(self, dx: f32, dy: f32) -> bool {
        match self {
            Self::TopLeft => dx <= 0.0 && dy <= 0.0,
            Self::TopRight => dx >= 0.0 && dy <= 0.0,
            Self::BottomLeft => dx <= 0.0 && dy >= 0.0,
            Self::BottomRight => dx >= 0.0 && dy >= 0.0,
        }
    }
}

/// Half-open pixel range covered by `[start, end)`; never empty for a
/// positive extent so one-pixel grain specks always land.
fn pixel_span(start: f32, end: f32) -> (i32, i32) {
    let a = start.round() as i32;
    let b = (end.round() as i32).max(a + 1);
    (a, b)
}

fn distance_to_segment(px: f32, py: f32, x0: f32, y0: f32, x1: f32, y1: f32) -> f32 {
    let (vx, vy) = (x1 - x0, y1 - y0);
    let len_sq = vx * vx + vy * vy;
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        (((px - x0) * vx + (py - y0) * vy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (x0 + vx * t, y0 + vy * t);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

fn measure_text(font: &FontArc, text: &str, scale: PxScale) -> f32 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut previous = None;
    for ch in text.chars() {
        let glyph_id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }
    width.max(0.0)
}

fn blend(src: (f32, f32, f32), dst: (f32, f32, f32), alpha: f32) -> (f32, f32, f32) {
    (
        src.0 * alpha + dst.0 * (1.0 - alpha),
        src.1 * alpha + dst.1 * (1.0 - alpha),
        src.2 * alpha + dst.2 * (1.0 - alpha),
    )
}

fn unpack_color(value: u32) -> (f32, f32, f32) {
    let r = ((value >> 16) & 0xFF) as f32 / 255.0;
    let g = ((value >> 8) & 0xFF) as f32 / 255.0;
    let b = (value & 0xFF) as f32 / 255.0;
    (r, g, b)
}

fn pack_color(color: (f32, f32, f32)) -> u32 {
    let r = (color.0.clamp(0.0, 1.0) * 255.0).round() as u32;
    let g = (color.1.clamp(0.0, 1.0) * 255.0).round() as u32;
    let b = (color.2.clamp(0.0, 1.0) * 255.0).round() as u32;
    0xFF00_0000 | (r << 16) | (g << 8) | b
}

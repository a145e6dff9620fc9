use rand::Rng;

use crate::canvas::{Canvas, Color, Translate};
use crate::config::TapestryOptions;
use crate::frame::Frame;

use super::noise::{Axis, NoiseField, value_noise};
use super::pan::Vec2;
use super::sampler::PixelSampler;

const MIN_THREADS: usize = 6;
const WEFT_ALPHA_OVER: u8 = 230;
const WEFT_ALPHA_UNDER: u8 = 130;
const WARP_ALPHA_OVER: u8 = 220;
const WARP_SHADOW: Color = Color::rgba(0, 0, 0, 30);

/// Which thread shows on top at one crossing.
///
/// The two tests share a boundary: at exactly the threshold the weft is
/// *not* over while the warp *is*, so a borderline cell gets a faint weft
/// and a solid warp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub weft_over: bool,
    pub warp_over: bool,
}

impl Crossing {
    pub fn classify(luminance: f32, threshold: f32) -> Self {
        Self {
            weft_over: luminance > threshold,
            warp_over: luminance <= threshold,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    x: f32,
    y: f32,
    color: Color,
    crossing: Crossing,
}

/// Draws the woven grid for one frame.
#[derive(Debug)]
pub struct TapestryRenderer {
    options: TapestryOptions,
    noise: NoiseField,
    warp_count: usize,
    weft_count: usize,
    cells: Vec<Cell>,
}

impl TapestryRenderer {
    pub fn new(options: TapestryOptions) -> Self {
        Self {
            options,
            noise: NoiseField::new(),
            warp_count: 0,
            weft_count: 0,
            cells: Vec::new(),
        }
    }

    pub fn options(&self) -> &TapestryOptions {
        &self.options
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    /// `(warp, weft)` as of the last rendered frame.
    pub fn thread_counts(&self) -> (usize, usize) {
        (self.warp_count, self.weft_count)
    }

    /// Grid dimensions for a canvas of the given size.
    pub fn grid_size(&self, width: u32, height: u32) -> (usize, usize) {
        let spacing = self.options.spacing.max(1.0);
        let count = |extent: u32| ((extent as f32 / spacing).floor() as usize).max(MIN_THREADS);
        (count(width), count(height))
    }

    /// Crossing threshold for thread `(i, j)` at animation time `t`.
    pub fn threshold_at(&self, i: usize, j: usize, t: f32) -> f32 {
        let range = self.options.jitter_range;
        let n = value_noise(i as f32 * 0.1, j as f32 * 0.05, t * 0.02);
        let jitter = -range + n * 2.0 * range;
        self.options.threshold + jitter * self.options.jitter_scale
    }

    pub fn render<R: Rng + ?Sized>(
        &mut self,
        canvas: &mut dyn Canvas,
        source: &Frame,
        pan: Vec2,
        t: f32,
        rng: &mut R,
    ) {
        canvas.clear(Color::WHITE);

        let (warp_count, weft_count) = self.grid_size(canvas.width(), canvas.height());
        self.warp_count = warp_count;
        self.weft_count = weft_count;
        self.noise.ensure_size(Axis::Warp, warp_count, rng);
        self.noise.ensure_size(Axis::Weft, weft_count, rng);

        self.layout_cells(canvas.width(), canvas.height(), source, pan, t);

        {
            let mut woven = Translate::new(canvas, pan.x, pan.y);
            self.draw_weft(&mut woven, rng);
            self.draw_warp(&mut woven, rng);
        }

        draw_grain(canvas, self.options.grain_count, rng);
    }

    /// Samples every crossing once; both passes read the same cells.
    fn layout_cells(&mut self, width: u32, height: u32, source: &Frame, pan: Vec2, t: f32) {
        let spacing = self.options.spacing;
        let wobble = self.options.wobble;
        let sampler = PixelSampler::new(source, width as f32, height as f32);

        let mut cells = std::mem::take(&mut self.cells);
        cells.clear();
        cells.reserve(self.warp_count * self.weft_count);
        for j in 0..self.weft_count {
            let y = j as f32 * spacing
                + (t * 0.8 + self.noise.phase_at(Axis::Weft, j)).sin() * wobble;
            for i in 0..self.warp_count {
                let x = i as f32 * spacing
                    + (t * 0.6 + self.noise.phase_at(Axis::Warp, i)).cos() * wobble;
                let color = sampler.sample(x - pan.x, y - pan.y);
                let threshold = self.threshold_at(i, j, t);
                cells.push(Cell {
                    x,
                    y,
                    color,
                    crossing: Crossing::classify(color.luminance(), threshold),
                });
            }
        }
        self.cells = cells;
    }

    fn cell(&self, i: usize, j: usize) -> Cell {
        self.cells[j * self.warp_count + i]
    }

    fn draw_weft<R: Rng + ?Sized>(&self, canvas: &mut dyn Canvas, rng: &mut R) {
        let spacing = self.options.spacing;
        let tw = self.options.thread_width;
        for j in 0..self.weft_count {
            for i in 0..self.warp_count {
                let cell = self.cell(i, j);
                let alpha = if cell.crossing.weft_over {
                    WEFT_ALPHA_OVER
                } else {
                    WEFT_ALPHA_UNDER
                };
                canvas.fill_rect(
                    cell.x - spacing * 0.6,
                    cell.y - tw * 0.5,
                    spacing * 1.2,
                    tw * rng.random_range(0.8..1.15),
                    cell.color.with_alpha(alpha),
                );
            }
        }
    }

    fn draw_warp<R: Rng + ?Sized>(&self, canvas: &mut dyn Canvas, rng: &mut R) {
        let spacing = self.options.spacing;
        let tw = self.options.thread_width;
        for i in 0..self.warp_count {
            for j in 0..self.weft_count {
                let cell = self.cell(i, j);
                let x = cell.x - tw * 0.5;
                let y = cell.y - spacing * 0.6;
                if cell.crossing.warp_over {
                    canvas.fill_rect(
                        x,
                        y,
                        tw * rng.random_range(0.8..1.2),
                        spacing * 1.2,
                        cell.color.with_alpha(WARP_ALPHA_OVER),
                    );
                } else {
                    canvas.fill_rect(x, y, tw * 0.5, spacing * 1.2, WARP_SHADOW);
                }
            }
        }
    }
}

fn draw_grain<R: Rng + ?Sized>(canvas: &mut dyn Canvas, count: usize, rng: &mut R) {
    let w = canvas.width() as f32;
    let h = canvas.height() as f32;
    if w <= 0.0 || h <= 0.0 {
        return;
    }
    for _ in 0..count {
        let alpha = rng.random_range(4.0f32..10.0) as u8;
        let x = rng.random_range(0.0..w);
        let y = rng.random_range(0.0..h);
        canvas.fill_rect(x, y, 1.0, 1.0, Color::BLACK.with_alpha(alpha));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::raster::PixelCanvas;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn borderline_luminance_puts_warp_on_top() {
        let crossing = Crossing::classify(128.0, 128.0);
        assert!(!crossing.weft_over);
        assert!(crossing.warp_over);
    }

    #[test]
    fn bright_and_dark_cells_pick_one_side() {
        assert_eq!(
            Crossing::classify(200.0, 128.0),
            Crossing {
                weft_over: true,
                warp_over: false
            }
        );
        assert_eq!(
            Crossing::classify(20.0, 128.0),
            Crossing {
                weft_over: false,
                warp_over: true
            }
        );
    }

    #[test]
    fn grid_never_drops_below_six_threads() {
        let renderer = TapestryRenderer::new(TapestryOptions::default());
        assert_eq!(renderer.grid_size(100, 50), (6, 6));
        assert_eq!(renderer.grid_size(1280, 800), (40, 25));
        assert_eq!(renderer.grid_size(0, 0), (6, 6));
    }

    #[test]
    fn zero_jitter_range_keeps_base_threshold() {
        let renderer = TapestryRenderer::new(TapestryOptions {
            jitter_range: 0.0,
            ..TapestryOptions::default()
        });
        assert_eq!(renderer.threshold_at(3, 4, 1.5), 128.0);
    }

    #[test]
    fn thresholds_stay_within_jitter_band() {
        let renderer = TapestryRenderer::new(TapestryOptions::default());
        for i in 0..20 {
            for j in 0..20 {
                let th = renderer.threshold_at(i, j, 0.7);
                assert!((119.0..=137.0).contains(&th), "threshold {th}");
            }
        }
    }

    #[test]
    fn render_grows_noise_with_canvas() {
        let mut renderer = TapestryRenderer::new(TapestryOptions::default());
        let mut rng = StdRng::seed_from_u64(3);
        let frame = crate::frame::placeholder();

        let mut big = PixelCanvas::new(640, 320);
        renderer.render(&mut big, &frame, Vec2::ZERO, 0.0, &mut rng);
        assert_eq!(renderer.thread_counts(), (20, 10));
        assert_eq!(renderer.noise().len(Axis::Warp), 20);

        let mut small = PixelCanvas::new(64, 64);
        renderer.render(&mut small, &frame, Vec2::ZERO, 0.01, &mut rng);
        assert_eq!(renderer.thread_counts(), (6, 6));
        assert_eq!(renderer.noise().len(Axis::Warp), 20);
        assert_eq!(renderer.noise().len(Axis::Weft), 10);
    }

    #[test]
    fn seeded_renders_are_identical() {
        let frame = crate::frame::placeholder();
        let draw = || {
            let mut renderer = TapestryRenderer::new(TapestryOptions::default());
            let mut rng = StdRng::seed_from_u64(42);
            let mut canvas = PixelCanvas::new(160, 120);
            renderer.render(&mut canvas, &frame, Vec2::new(4.0, -2.0), 0.5, &mut rng);
            canvas.pixels().to_vec()
        };
        assert_eq!(draw(), draw());
    }
}

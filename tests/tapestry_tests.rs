use rand::SeedableRng;
use rand::rngs::StdRng;

use tapestry_capture::canvas::{Anchor, Canvas, Color};
use tapestry_capture::config::TapestryOptions;
use tapestry_capture::frame::Frame;
use tapestry_capture::tapestry::sampler::{self, NO_PIXELS, OUT_OF_BOUNDS};
use tapestry_capture::tapestry::{Axis, TapestryRenderer, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    color: Color,
}

/// Records fills instead of rasterizing them.
struct RecordingCanvas {
    width: u32,
    height: u32,
    cleared: Option<Color>,
    rects: Vec<Rect>,
}

impl RecordingCanvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cleared: None,
            rects: Vec::new(),
        }
    }
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, color: Color) {
        self.cleared = Some(color);
        self.rects.clear();
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.rects.push(Rect { x, y, w, h, color });
    }

    fn fill_circle(&mut self, _cx: f32, _cy: f32, _diameter: f32, _color: Color) {}

    fn line(&mut self, _x0: f32, _y0: f32, _x1: f32, _y1: f32, _weight: f32, _color: Color) {}

    fn image(&mut self, _frame: &Frame, _x: f32, _y: f32, _w: f32, _h: f32) {}

    fn text(&mut self, _text: &str, _x: f32, _y: f32, _size: f32, _anchor: Anchor, _color: Color) {}
}

fn flat_options() -> TapestryOptions {
    TapestryOptions {
        jitter_range: 0.0,
        wobble: 0.0,
        grain_count: 0,
        ..TapestryOptions::default()
    }
}

#[test]
fn thread_counts_follow_canvas_size() {
    let mut renderer = TapestryRenderer::new(TapestryOptions::default());
    let mut rng = StdRng::seed_from_u64(1);
    let frame = Frame::solid(4, 4, [0, 0, 0, 255]);
    for (w, h) in [(1280, 800), (100, 100), (193, 600), (32, 31)] {
        let mut canvas = RecordingCanvas::new(w, h);
        renderer.render(&mut canvas, &frame, Vec2::ZERO, 0.0, &mut rng);
        let expect = |extent: u32| ((extent as f32 / 32.0).floor() as usize).max(6);
        assert_eq!(renderer.thread_counts(), (expect(w), expect(h)));
    }
    // Noise grew to the largest grid seen and never shrank.
    assert_eq!(renderer.noise().len(Axis::Warp), 40);
    assert_eq!(renderer.noise().len(Axis::Weft), 25);
}

#[test]
fn uniform_image_samples_uniformly() {
    let frame = Frame::solid(7, 3, [12, 34, 56, 255]);
    for (x, y) in [(0.0, 0.0), (99.5, 10.0), (199.0, 149.0), (50.0, 75.0)] {
        assert_eq!(
            sampler::sample(&frame, 200.0, 150.0, x, y),
            Color::rgb(12, 34, 56)
        );
    }
}

#[test]
fn empty_and_short_buffers_yield_sentinels() {
    assert_eq!(sampler::sample(&Frame::empty(), 10.0, 10.0, 1.0, 1.0), NO_PIXELS);
    let short = Frame::from_rgba(3, 3, vec![0; 8]);
    assert_eq!(sampler::sample(&short, 3.0, 3.0, 2.5, 2.5), OUT_OF_BOUNDS);
}

#[test]
fn background_is_white_and_grain_is_faint() {
    let mut renderer = TapestryRenderer::new(TapestryOptions {
        grain_count: 400,
        ..flat_options()
    });
    let mut rng = StdRng::seed_from_u64(9);
    let mut canvas = RecordingCanvas::new(320, 240);
    renderer.render(&mut canvas, &Frame::solid(2, 2, [200, 200, 200, 255]), Vec2::ZERO, 0.0, &mut rng);

    assert_eq!(canvas.cleared, Some(Color::WHITE));
    let grain: Vec<&Rect> = canvas.rects.iter().rev().take(400).collect();
    for r in grain {
        assert_eq!((r.w, r.h), (1.0, 1.0));
        assert_eq!((r.color.r, r.color.g, r.color.b), (0, 0, 0));
        assert!((4..10).contains(&r.color.a), "grain alpha {}", r.color.a);
        assert!((0.0..320.0).contains(&r.x) && (0.0..240.0).contains(&r.y));
    }
}

#[test]
fn borderline_gray_draws_faint_weft_and_solid_warp() {
    let mut renderer = TapestryRenderer::new(flat_options());
    let mut rng = StdRng::seed_from_u64(5);
    let mut canvas = RecordingCanvas::new(192, 192);
    renderer.render(&mut canvas, &Frame::solid(1, 1, [128, 128, 128, 255]), Vec2::ZERO, 0.0, &mut rng);

    let cells = 6 * 6;
    assert_eq!(canvas.rects.len(), cells * 2);
    let (weft, warp) = canvas.rects.split_at(cells);
    assert!(weft.iter().all(|r| r.color == Color::rgba(128, 128, 128, 130)));
    assert!(warp.iter().all(|r| r.color == Color::rgba(128, 128, 128, 220)));
    for r in weft {
        assert!((r.w - 32.0 * 1.2).abs() < 1e-4);
        assert!(r.h >= 6.0 * 0.8 && r.h < 6.0 * 1.15);
    }
    for r in warp {
        assert!(r.w >= 6.0 * 0.8 && r.w < 6.0 * 1.2);
    }
}

#[test]
fn bright_source_leaves_only_warp_shadows() {
    let mut renderer = TapestryRenderer::new(flat_options());
    let mut rng = StdRng::seed_from_u64(5);
    let mut canvas = RecordingCanvas::new(192, 192);
    renderer.render(&mut canvas, &Frame::solid(1, 1, [250, 250, 250, 255]), Vec2::ZERO, 0.0, &mut rng);

    let (weft, warp) = canvas.rects.split_at(36);
    assert!(weft.iter().all(|r| r.color.a == 230));
    for r in warp {
        assert_eq!(r.color, Color::rgba(0, 0, 0, 30));
        assert_eq!(r.w, 3.0);
    }
}

#[test]
fn pan_offsets_threads_but_not_grain() {
    let options = TapestryOptions {
        grain_count: 1,
        ..flat_options()
    };
    let frame = Frame::solid(1, 1, [10, 10, 10, 255]);
    let draw = |pan: Vec2| {
        let mut renderer = TapestryRenderer::new(options.clone());
        let mut rng = StdRng::seed_from_u64(77);
        let mut canvas = RecordingCanvas::new(192, 192);
        renderer.render(&mut canvas, &frame, pan, 0.0, &mut rng);
        canvas.rects
    };
    let still = draw(Vec2::ZERO);
    let moved = draw(Vec2::new(15.0, -4.0));
    assert_eq!(still.len(), moved.len());

    let (last_still, threads_still) = still.split_last().unwrap();
    let (last_moved, threads_moved) = moved.split_last().unwrap();
    for (a, b) in threads_still.iter().zip(threads_moved) {
        assert!((b.x - a.x - 15.0).abs() < 1e-4);
        assert!((b.y - a.y + 4.0).abs() < 1e-4);
    }
    assert_eq!((last_still.x, last_still.y), (last_moved.x, last_moved.y));
}

#[test]
fn threads_sample_the_letterboxed_source() {
    // Left half black, right half white: the weft over the right half is
    // opaque, over the left half faint.
    let mut pixels = Vec::new();
    for x in 0..2 {
        let v = if x == 0 { 0 } else { 255 };
        pixels.extend_from_slice(&[v, v, v, 255]);
    }
    let frame = Frame::from_rgba(2, 1, pixels);
    let mut renderer = TapestryRenderer::new(flat_options());
    let mut rng = StdRng::seed_from_u64(2);
    let mut canvas = RecordingCanvas::new(384, 192);
    renderer.render(&mut canvas, &frame, Vec2::ZERO, 0.0, &mut rng);

    let (warp_count, weft_count) = renderer.thread_counts();
    assert_eq!((warp_count, weft_count), (12, 6));
    let weft = &canvas.rects[..warp_count * weft_count];
    for (k, r) in weft.iter().enumerate() {
        let i = k % warp_count;
        let centre_x = i as f32 * 32.0;
        if centre_x < 192.0 {
            assert_eq!(r.color, Color::rgba(0, 0, 0, 130));
        } else {
            assert_eq!(r.color, Color::rgba(255, 255, 255, 230));
        }
    }
}

#[test]
fn panned_threads_sample_behind_the_offset() {
    // Left half black, right half white. Panning right by two threads moves
    // the black/white edge two columns right as well.
    let frame = Frame::from_rgba(2, 1, vec![0, 0, 0, 255, 255, 255, 255, 255]);
    let pan = Vec2::new(64.0, 10.0);
    let mut renderer = TapestryRenderer::new(flat_options());
    let mut rng = StdRng::seed_from_u64(4);
    let mut canvas = RecordingCanvas::new(384, 192);
    renderer.render(&mut canvas, &frame, pan, 0.0, &mut rng);

    let (warp_count, weft_count) = renderer.thread_counts();
    let weft = &canvas.rects[..warp_count * weft_count];
    for (k, r) in weft.iter().enumerate() {
        let i = k % warp_count;
        let sampled_x = i as f32 * 32.0 - pan.x;
        let expected = if sampled_x < 192.0 {
            Color::rgba(0, 0, 0, 130)
        } else {
            Color::rgba(255, 255, 255, 230)
        };
        assert_eq!(r.color, expected, "column {i}");
    }
    // Column 6 sits over the white half on screen but samples black.
    assert_eq!(weft[6].color, Color::rgba(0, 0, 0, 130));
    assert_eq!(weft[8].color, Color::rgba(255, 255, 255, 230));
}

//! Overlays drawn on top of the tapestry, one screen per session state.

use std::time::{Duration, Instant};

use crate::canvas::{Anchor, Canvas, Color};
use crate::session::shutter::overlay_alpha;
use crate::session::{CaptureScheduler, Session, SessionState, Snapshot};

/// Side of the photo square on a canvas with room to spare.
pub const PANEL_SIZE: f32 = 400.0;

const PROMPT: &str = "Click anywhere to start and allow camera/microphone access";
const NOTICE_COLOR: Color = Color::rgb(255, 100, 100);
const MARKER_COLOR: Color = Color::rgba(255, 0, 0, 150);

/// Photo square side for a canvas; shrinks so the visualization card still
/// fits on small surfaces.
pub fn panel_size(width: u32, height: u32) -> f32 {
    let fit = (width as f32 - 40.0).min(height as f32 - 120.0);
    PANEL_SIZE.min(fit).max(40.0)
}

/// Prompt on the waiting panel, naming how long the session will run.
pub fn waiting_caption(session_length: Duration) -> String {
    format!(
        "Click to begin the {} documentation.",
        humantime::format_duration(session_length)
    )
}

/// Linear map of `clicks` from `0..10` onto `20..100`, clamped.
pub fn marker_diameter(clicks: u32) -> f32 {
    let t = (clicks as f32 / 10.0).clamp(0.0, 1.0);
    20.0 + t * 80.0
}

/// Everything drawn after the tapestry for one frame.
pub fn draw_overlay<S: CaptureScheduler>(
    canvas: &mut dyn Canvas,
    session: &mut Session<S>,
    threads: (usize, usize),
    now: Instant,
) {
    match session.state() {
        SessionState::AwaitingPermission => draw_prompt(canvas),
        SessionState::Waiting => {
            let options = session.options();
            let length = options
                .capture_interval
                .saturating_mul(u32::try_from(options.total_captures).unwrap_or(u32::MAX));
            let caption = waiting_caption(length);
            let preview = session.preview(now);
            draw_waiting(canvas, preview.as_ref(), &caption);
        }
        SessionState::Capturing => {
            if let Some(latest) = session.gallery().latest() {
                let caption = format!(
                    "Displaying {} of {}. Next capture in {}s.",
                    session.gallery().len(),
                    session.gallery().capacity(),
                    session.seconds_until_next_capture(now)
                );
                draw_visualization(canvas, latest);
                draw_caption(canvas, &caption);
            }
        }
        SessionState::Browsing => {
            let gallery = session.gallery();
            if let Some(snapshot) = gallery.current() {
                let caption = format!(
                    "Browsing {} of {}. Click for next.",
                    gallery.cursor() + 1,
                    gallery.capacity()
                );
                draw_visualization(canvas, snapshot);
                draw_caption(canvas, &caption);
            }
        }
    }

    draw_notices(canvas, session.notices());
    draw_thread_readout(canvas, threads);

    if let Some(intensity) = session.flash() {
        draw_flash(canvas, intensity);
    }
}

fn draw_prompt(canvas: &mut dyn Canvas) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    canvas.fill_rect(0.0, 0.0, w, h, Color::BLACK.with_alpha(150));
    canvas.text(PROMPT, w / 2.0, h / 2.0, 24.0, Anchor::Center, Color::WHITE);
}

fn draw_waiting(canvas: &mut dyn Canvas, preview: Option<&crate::frame::Frame>, caption: &str) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let s = panel_size(canvas.width(), canvas.height());
    let (x, y) = ((w - s) / 2.0, (h - s) / 2.0);
    canvas.fill_rounded_rect(
        x - 20.0,
        y - 20.0,
        s + 40.0,
        s + 40.0,
        12.0,
        Color::WHITE.with_alpha(220),
    );
    if let Some(frame) = preview {
        canvas.image(frame, x, y, s, s);
    }
    canvas.text(
        caption,
        w / 2.0,
        h / 2.0,
        20.0,
        Anchor::Center,
        Color::BLACK,
    );
}

/// Photo card with key radials, the pointer marker and the metrics block.
pub fn draw_visualization(canvas: &mut dyn Canvas, snapshot: &Snapshot) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    let s = panel_size(canvas.width(), canvas.height());
    let (x, y) = ((w - s) / 2.0, (h - s) / 2.0);

    canvas.fill_rounded_rect(
        x - 20.0,
        y - 20.0,
        s + 40.0,
        s + 120.0,
        10.0,
        Color::WHITE.with_alpha(200),
    );
    canvas.image(snapshot.photo(), x, y, s, s);

    let (cx, cy) = (x + s / 2.0, y + s / 2.0);
    for k in 0..snapshot.keys() {
        let angle = k as f32 * std::f32::consts::PI / 8.0;
        let (dx, dy) = (angle.cos() * s / 4.0, angle.sin() * s / 4.0);
        canvas.line(cx - dx, cy - dy, cx + dx, cy + dy, 2.0, Color::WHITE);
    }

    if let Some(mean) = snapshot.mean_pointer() {
        let mx = x + mean.x / w.max(1.0) * s;
        let my = y + mean.y / h.max(1.0) * s;
        canvas.fill_circle(mx, my, marker_diameter(snapshot.clicks()), MARKER_COLOR);
    }

    let metrics = format!(
        "MIC: {:.3}\nTIME: {}",
        snapshot.mic_level(),
        snapshot.timestamp()
    );
    canvas.text(&metrics, 20.0, 20.0, 12.0, Anchor::TopLeft, Color::BLACK);
}

fn draw_caption(canvas: &mut dyn Canvas, caption: &str) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    canvas.text(caption, w / 2.0, h - 20.0, 14.0, Anchor::Center, Color::BLACK);
}

fn draw_notices<'a>(canvas: &mut dyn Canvas, notices: impl Iterator<Item = &'a str>) {
    for (i, notice) in notices.enumerate() {
        canvas.text(
            notice,
            20.0,
            60.0 + i as f32 * 18.0,
            12.0,
            Anchor::TopLeft,
            NOTICE_COLOR,
        );
    }
}

fn draw_thread_readout(canvas: &mut dyn Canvas, (warp, weft): (usize, usize)) {
    let h = canvas.height() as f32;
    let label = format!("warp {warp} / weft {weft}");
    canvas.text(
        &label,
        20.0,
        h - 28.0,
        11.0,
        Anchor::TopLeft,
        Color::gray(60).with_alpha(180),
    );
}

fn draw_flash(canvas: &mut dyn Canvas, intensity: u8) {
    let (w, h) = (canvas.width() as f32, canvas.height() as f32);
    canvas.fill_rect(
        0.0,
        0.0,
        w,
        h,
        Color::WHITE.with_alpha(overlay_alpha(intensity)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::raster::PixelCanvas;
    use crate::events::Tick;
    use crate::session::{ManualScheduler, SessionOptions};

    #[test]
    fn marker_diameter_is_clamped() {
        assert_eq!(marker_diameter(0), 20.0);
        assert_eq!(marker_diameter(5), 60.0);
        assert_eq!(marker_diameter(10), 100.0);
        assert_eq!(marker_diameter(250), 100.0);
    }

    #[test]
    fn waiting_caption_names_session_length() {
        assert_eq!(
            waiting_caption(Duration::from_secs(60)),
            "Click to begin the 1m documentation."
        );
        assert_eq!(
            waiting_caption(Duration::from_secs(90)),
            "Click to begin the 1m 30s documentation."
        );
    }

    #[test]
    fn panel_shrinks_on_small_canvases() {
        assert_eq!(panel_size(1280, 800), 400.0);
        assert_eq!(panel_size(640, 400), 280.0);
        assert_eq!(panel_size(10, 10), 40.0);
    }

    #[test]
    fn initial_screen_veils_the_canvas() {
        let t0 = Tick::now();
        let mut session = Session::new(
            SessionOptions::default(),
            crate::frame::placeholder(),
            ManualScheduler::new(),
            t0,
        );
        let mut canvas = PixelCanvas::new(32, 32);
        canvas.clear(Color::WHITE);
        draw_overlay(&mut canvas, &mut session, (6, 6), t0.at);
        // 255 * (1 - 150/255) = 105
        let px = canvas.pixel(0, 0).unwrap();
        let red = (px >> 16) & 0xFF;
        assert!((104..=106).contains(&red), "red channel {red}");
    }
}

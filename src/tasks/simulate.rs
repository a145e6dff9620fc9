//! Runs a whole session without a window: virtual clock, manual timers,
//! scripted pointer and keyboard, offscreen canvas.

use std::time::Duration;

use anyhow::{Result, ensure};
use rand::Rng;
use tracing::{debug, info};

use crate::canvas::raster::PixelCanvas;
use crate::config::Configuration;
use crate::events::{InputEvent, Tick};
use crate::media::ConfiguredDevices;
use crate::session::{ManualScheduler, Session, SessionOptions, SessionState, Snapshot};
use crate::tapestry::TapestryRenderer;
use crate::view;

use super::{initial_source, seeded_rng};

/// Frames spent on the waiting screen before the scripted start press.
const WAITING_FRAMES: u32 = 10;
const CLICK_PROBABILITY: f64 = 0.03;
const KEY_PROBABILITY: f64 = 0.02;
/// The scripted input draws from its own stream, apart from the renderer's.
const SCRIPT_SEED_OFFSET: u64 = 0x5eed_1e55;

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub frames: u64,
    pub state: SessionState,
    pub snapshots: Vec<Snapshot>,
    /// Snapshot indices visited while browsing, in order.
    pub browsed: Vec<usize>,
    /// Capture ticks delivered after the session completed.
    pub late_ticks: usize,
}

pub fn run(cfg: &Configuration) -> Result<SimulationReport> {
    let sim = &cfg.simulation;
    let frame_dt = Duration::from_secs_f64(1.0 / f64::from(sim.frame_rate.max(1)));
    let (w, h) = (sim.canvas_width, sim.canvas_height);

    let mut clock = Tick::now();
    let mut session = Session::new(
        SessionOptions::from_config(cfg),
        initial_source(cfg),
        ManualScheduler::new(),
        clock,
    );
    let mut devices = ConfiguredDevices::from_config(cfg);
    let mut renderer = TapestryRenderer::new(cfg.tapestry.clone());
    let mut canvas = PixelCanvas::new(w, h);
    let mut rng = seeded_rng(cfg.seed);
    let mut script = seeded_rng(cfg.seed.map(|seed| seed.wrapping_add(SCRIPT_SEED_OFFSET)));
    let phase: f32 = script.random_range(0.0..std::f32::consts::TAU);

    let budget = cfg.session.total_duration + cfg.session.capture_interval * 2;
    let max_frames = (budget.as_secs_f64() / frame_dt.as_secs_f64()).ceil() as u64
        + u64::from(WAITING_FRAMES)
        + 1;

    info!(
        captures = session.options().total_captures,
        width = w,
        height = h,
        frame_rate = sim.frame_rate,
        "simulation started"
    );

    session.handle_input(InputEvent::PointerPressed, &mut devices, clock);
    session.handle_input(InputEvent::PointerReleased, &mut devices, clock);

    let mut frames = 0u64;
    let mut waited = 0u32;
    while session.state() != SessionState::Browsing && frames < max_frames {
        clock = clock.after(frame_dt);
        for id in session.scheduler_mut().poll(clock.at) {
            session.on_timer(id, clock);
        }

        let t = frames as f32 * frame_dt.as_secs_f32();
        let x = w as f32 * (0.5 + 0.4 * (t * 1.3).sin());
        let y = h as f32 * (0.5 + 0.4 * (t * 1.7 + phase).sin());
        session.handle_input(InputEvent::PointerMoved { x, y }, &mut devices, clock);

        match session.state() {
            SessionState::Waiting => {
                waited += 1;
                if waited >= WAITING_FRAMES {
                    session.handle_input(InputEvent::PointerPressed, &mut devices, clock);
                    session.handle_input(InputEvent::PointerReleased, &mut devices, clock);
                }
            }
            SessionState::Capturing => {
                if script.random_bool(CLICK_PROBABILITY) {
                    session.handle_input(InputEvent::PointerPressed, &mut devices, clock);
                    session.handle_input(InputEvent::PointerReleased, &mut devices, clock);
                }
                if script.random_bool(KEY_PROBABILITY) {
                    session.handle_input(InputEvent::KeyPressed, &mut devices, clock);
                }
            }
            _ => {}
        }

        draw_frame(&mut session, &mut renderer, &mut canvas, &mut rng, clock);
        frames += 1;
    }

    ensure!(
        session.state() == SessionState::Browsing,
        "session did not complete within {frames} simulated frames"
    );

    // Ticks that were already queued when the session ended must not add
    // anything.
    clock = clock.after(cfg.session.capture_interval * 2);
    let late: Vec<_> = session.scheduler_mut().poll(clock.at);
    let late_ticks = late.len();
    for id in late {
        session.on_timer(id, clock);
    }

    let mut browsed = Vec::with_capacity(session.gallery().len());
    for _ in 0..session.gallery().len() {
        if let Some(snapshot) = session.gallery().current() {
            debug!(
                index = snapshot.index(),
                at = %snapshot.timestamp(),
                "browsing snapshot"
            );
            browsed.push(snapshot.index());
        }
        clock = clock.after(frame_dt);
        session.handle_input(InputEvent::PointerPressed, &mut devices, clock);
        session.handle_input(InputEvent::PointerReleased, &mut devices, clock);
        draw_frame(&mut session, &mut renderer, &mut canvas, &mut rng, clock);
        frames += 1;
    }

    info!(
        frames,
        snapshots = session.gallery().len(),
        "simulation finished"
    );
    Ok(SimulationReport {
        frames,
        state: session.state(),
        snapshots: session.gallery().iter().cloned().collect(),
        browsed,
        late_ticks,
    })
}

fn draw_frame<R: Rng + ?Sized>(
    session: &mut Session<ManualScheduler>,
    renderer: &mut TapestryRenderer,
    canvas: &mut PixelCanvas,
    rng: &mut R,
    clock: Tick,
) {
    session.frame_tick(clock);
    let source = session.source().clone();
    renderer.render(
        canvas,
        &source,
        session.pan(),
        session.animation_time(),
        rng,
    );
    view::draw_overlay(canvas, session, renderer.thread_counts(), clock.at);
}

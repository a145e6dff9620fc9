//! Everything that changes during a documentation session, owned by one
//! [`Session`] value.
//!
//! Two message sources drive it from a single thread: frame ticks
//! ([`Session::frame_tick`]) and capture-timer ticks ([`Session::on_timer`]).
//! Input arrives through [`Session::handle_input`]. Nothing here blocks or
//! spawns; the scheduler behind [`CaptureScheduler`] decides where ticks
//! come from.

pub mod aggregator;
pub mod gallery;
pub mod shutter;
pub mod state;
pub mod timer;

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::events::{InputEvent, Tick};
use crate::frame::Frame;
use crate::media::{AudioInput, MediaDevices, VideoSource};
use crate::tapestry::{PanOffset, Vec2};

pub use aggregator::{CaptureAggregator, InteractionAccumulator};
pub use gallery::{Snapshot, SnapshotGallery};
pub use shutter::Shutter;
pub use state::{SessionSM, SessionState, SessionStateChange};
pub use timer::{CaptureScheduler, ManualScheduler, TimerId};

/// How long a device notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(8);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub capture_interval: Duration,
    pub total_captures: usize,
    pub pan_smoothing: f32,
    pub mic_smoothing: f32,
    pub time_step: f32,
    pub weave_live_preview: bool,
}

impl SessionOptions {
    pub fn from_config(cfg: &Configuration) -> Self {
        Self {
            capture_interval: cfg.session.capture_interval,
            total_captures: cfg.session.total_captures(),
            pan_smoothing: cfg.tapestry.pan_smoothing,
            mic_smoothing: cfg.microphone.smoothing,
            time_step: cfg.tapestry.time_step,
            weave_live_preview: cfg.tapestry.weave_live_preview,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Configuration::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A snapshot was appended at this index.
    Captured(usize),
    /// The gallery was already complete; the session moved to browsing.
    Finished,
    /// Not capturing, or the tick came from a cancelled timer.
    Ignored,
}

/// The picture the tapestry is currently woven from.
#[derive(Debug, Clone)]
pub struct SourceSlot {
    frame: Frame,
}

impl SourceSlot {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }

    pub fn get(&self) -> &Frame {
        &self.frame
    }

    /// Swaps in a new source, returning the old one.
    pub fn replace(&mut self, frame: Frame) -> Frame {
        std::mem::replace(&mut self.frame, frame)
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    expires_at: Instant,
}

#[derive(Default)]
struct MediaStreams {
    video: Option<Box<dyn VideoSource>>,
    audio: Option<Box<dyn AudioInput>>,
}

pub struct Session<S: CaptureScheduler> {
    options: SessionOptions,
    sm: SessionSM,
    aggregator: CaptureAggregator,
    gallery: SnapshotGallery,
    source: SourceSlot,
    media: MediaStreams,
    scheduler: S,
    timer: Option<TimerId>,
    last_capture_at: Option<Instant>,
    mic_level: f32,
    pan: PanOffset,
    shutter: Shutter,
    flash_requested: bool,
    flash: Option<u8>,
    frame_count: u64,
    pointer: Option<Vec2>,
    pointer_held: bool,
    wall: DateTime<Utc>,
    notices: Vec<Notice>,
}

impl<S: CaptureScheduler> Session<S> {
    pub fn new(options: SessionOptions, placeholder: Frame, scheduler: S, tick: Tick) -> Self {
        let capacity = options.total_captures;
        let pan = PanOffset::new(options.pan_smoothing);
        Self {
            options,
            sm: SessionSM::new(tick.at),
            aggregator: CaptureAggregator::new(),
            gallery: SnapshotGallery::new(capacity),
            source: SourceSlot::new(placeholder),
            media: MediaStreams::default(),
            scheduler,
            timer: None,
            last_capture_at: None,
            mic_level: 0.0,
            pan,
            shutter: Shutter::default(),
            flash_requested: false,
            flash: None,
            frame_count: 0,
            pointer: None,
            pointer_held: false,
            wall: tick.wall,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.sm.current()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn gallery(&self) -> &SnapshotGallery {
        &self.gallery
    }

    pub fn interaction(&self) -> &InteractionAccumulator {
        self.aggregator.interaction()
    }

    /// Frame the tapestry should sample this frame.
    pub fn source(&self) -> &Frame {
        self.source.get()
    }

    pub fn mic_level(&self) -> f32 {
        self.mic_level
    }

    pub fn pan(&self) -> Vec2 {
        self.pan.current()
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Animation time fed to the renderer.
    pub fn animation_time(&self) -> f32 {
        self.frame_count as f32 * self.options.time_step
    }

    pub fn wall_clock(&self) -> DateTime<Utc> {
        self.wall
    }

    /// Shutter intensity for the frame being drawn, if a flash is running.
    pub fn flash(&self) -> Option<u8> {
        self.flash
    }

    pub fn notices(&self) -> impl Iterator<Item = &str> {
        self.notices.iter().map(|n| n.text.as_str())
    }

    pub fn active_timer(&self) -> Option<TimerId> {
        self.timer
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn has_camera(&self) -> bool {
        self.media.video.is_some()
    }

    pub fn has_microphone(&self) -> bool {
        self.media.audio.is_some()
    }

    /// Live camera frame for the waiting panel.
    pub fn preview(&mut self, now: Instant) -> Option<Frame> {
        self.media.video.as_mut().and_then(|v| v.preview(now))
    }

    /// Whole seconds until the next capture, never negative.
    pub fn seconds_until_next_capture(&self, now: Instant) -> u64 {
        let Some(last) = self.last_capture_at else {
            return self.options.capture_interval.as_secs();
        };
        self.options
            .capture_interval
            .saturating_sub(now.saturating_duration_since(last))
            .as_secs()
    }

    pub fn handle_input(&mut self, event: InputEvent, devices: &mut dyn MediaDevices, tick: Tick) {
        match event {
            InputEvent::PointerMoved { x, y } => self.pointer_moved(Vec2::new(x, y)),
            InputEvent::PointerPressed => self.pointer_pressed(devices, tick),
            InputEvent::PointerReleased => self.pointer_held = false,
            InputEvent::KeyPressed => self.key_pressed(),
        }
    }

    /// Tracks the pointer; while the button is held the move also drags the
    /// woven picture.
    pub fn pointer_moved(&mut self, position: Vec2) {
        if let (true, Some(previous)) = (self.pointer_held, self.pointer) {
            self.pan.nudge(position - previous);
        }
        self.pointer = Some(position);
    }

    pub fn pointer_pressed(&mut self, devices: &mut dyn MediaDevices, tick: Tick) {
        self.pointer_held = true;
        match self.state() {
            SessionState::AwaitingPermission => self.activate(devices, tick),
            SessionState::Waiting => self.start_capturing(tick),
            SessionState::Capturing => self.aggregator.interaction_mut().record_click(),
            SessionState::Browsing => {
                if let Some(snapshot) = self.gallery.advance() {
                    debug!(index = snapshot.index(), "browsing snapshot");
                }
            }
        }
    }

    pub fn key_pressed(&mut self) {
        if self.state() == SessionState::Capturing {
            self.aggregator.interaction_mut().record_key();
        }
    }

    /// Requests camera and microphone, then moves on to the waiting screen
    /// whether or not either could be opened.
    pub fn activate(&mut self, devices: &mut dyn MediaDevices, tick: Tick) {
        if self.state() != SessionState::AwaitingPermission {
            return;
        }
        match devices.open_camera() {
            Ok(video) => self.media.video = Some(video),
            Err(err) => {
                warn!(error = %err, "continuing without a camera");
                self.push_notice(err.to_string(), tick.at);
            }
        }
        match devices.open_microphone() {
            Ok(audio) => self.media.audio = Some(audio),
            Err(err) => {
                warn!(error = %err, "continuing without a microphone");
                self.push_notice(err.to_string(), tick.at);
            }
        }
        if let Some(ch) = self.sm.on_activated(tick.at) {
            info!(
                from = ?ch.from,
                to = ?ch.to,
                camera = self.has_camera(),
                microphone = self.has_microphone(),
                "session activated"
            );
        }
    }

    fn start_capturing(&mut self, tick: Tick) {
        let Some(ch) = self.sm.on_start(tick.at) else {
            return;
        };
        info!(
            from = ?ch.from,
            to = ?ch.to,
            captures = self.options.total_captures,
            interval = %humantime::format_duration(self.options.capture_interval),
            "capture started"
        );
        self.cancel_timer();
        self.aggregator.reset();
        self.capture_tick(tick);
        if self.state() == SessionState::Capturing {
            self.timer = Some(self.scheduler.arm(self.options.capture_interval, tick.at));
        }
    }

    /// Delivers a capture-timer tick. Ticks from anything but the armed
    /// timer are dropped.
    pub fn on_timer(&mut self, id: TimerId, tick: Tick) -> CaptureOutcome {
        if self.timer != Some(id) {
            debug!(?id, active = ?self.timer, "ignoring stale capture tick");
            return CaptureOutcome::Ignored;
        }
        self.capture_tick(tick)
    }

    pub fn capture_tick(&mut self, tick: Tick) -> CaptureOutcome {
        if self.gallery.is_full() {
            self.finish(tick);
            return CaptureOutcome::Finished;
        }
        if self.state() != SessionState::Capturing {
            return CaptureOutcome::Ignored;
        }

        self.flash_requested = true;
        self.last_capture_at = Some(tick.at);

        let photo = match self.media.video.as_mut().and_then(|v| v.capture_frame(tick.at)) {
            Some(frame) => frame,
            None => self.source.get().clone(),
        };
        self.source.replace(photo.clone());

        let index = self.gallery.len();
        let snapshot = self
            .aggregator
            .materialize(index, tick.wall, photo, self.mic_level);
        info!(
            index,
            mic = snapshot.mic_level(),
            clicks = snapshot.clicks(),
            keys = snapshot.keys(),
            "snapshot captured"
        );
        if let Err(err) = self.gallery.push(snapshot) {
            warn!(error = %err, "dropping snapshot");
        }

        if self.gallery.is_full() {
            self.finish(tick);
        }
        CaptureOutcome::Captured(index)
    }

    fn finish(&mut self, tick: Tick) {
        self.cancel_timer();
        if let Some(ch) = self.sm.on_finished(tick.at) {
            self.gallery.rewind();
            info!(
                from = ?ch.from,
                to = ?ch.to,
                snapshots = self.gallery.len(),
                "session complete"
            );
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(id) = self.timer.take() {
            self.scheduler.cancel(id);
        }
    }

    /// Per-frame bookkeeping, run before anything is drawn.
    pub fn frame_tick(&mut self, tick: Tick) {
        let raw = self.media.audio.as_mut().map_or(0.0, |a| a.level());
        self.mic_level += (raw.clamp(0.0, 1.0) - self.mic_level) * self.options.mic_smoothing;
        self.wall = tick.wall;
        self.pan.step();
        self.frame_count += 1;

        if std::mem::take(&mut self.flash_requested) {
            self.shutter.trigger();
        }
        self.flash = self.shutter.next_frame();

        match self.state() {
            SessionState::Capturing => {
                if let Some(p) = self.pointer {
                    self.aggregator.interaction_mut().record_pointer(p);
                }
            }
            SessionState::Waiting if self.options.weave_live_preview => {
                if let Some(frame) = self.preview(tick.at) {
                    self.source.replace(frame);
                }
            }
            _ => {}
        }

        self.notices.retain(|n| n.expires_at > tick.at);
    }

    pub fn push_notice(&mut self, text: impl Into<String>, now: Instant) {
        self.notices.push(Notice {
            text: text.into(),
            expires_at: now + NOTICE_TTL,
        });
    }
}

impl<S: CaptureScheduler> Drop for Session<S> {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

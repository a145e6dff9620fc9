//! Camera and microphone collaborators.
//!
//! The session only talks to the [`VideoSource`], [`AudioInput`] and
//! [`MediaDevices`] traits. The implementations here are enough to run the
//! tool without a capture backend: a still image or a moving test card for
//! video, silence or a random walk for audio, and optionally the system
//! default input via `cpal`.

#[cfg(feature = "microphone")]
mod system_mic;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::{CameraConfig, CameraKind, Configuration, MicrophoneKind};
use crate::error::MediaError;
use crate::frame::Frame;

/// Live video feed. `at` is the session clock of the frame asking, so
/// sources that animate follow the session's time rather than the wall.
pub trait VideoSource {
    /// Latest live frame, if the device has produced one.
    fn preview(&mut self, at: Instant) -> Option<Frame>;

    /// A frozen copy of the current frame, detached from the live feed.
    fn capture_frame(&mut self, at: Instant) -> Option<Frame>;
}

pub trait AudioInput {
    /// Raw input level in `[0, 1]`.
    fn level(&mut self) -> f32;
}

/// Hands out the session's camera and microphone.
pub trait MediaDevices {
    fn open_camera(&mut self) -> Result<Box<dyn VideoSource>, MediaError>;
    fn open_microphone(&mut self) -> Result<Box<dyn AudioInput>, MediaError>;
}

/// A single image standing in for a camera.
#[derive(Debug, Clone)]
pub struct StillCamera {
    frame: Frame,
}

impl StillCamera {
    pub fn new(frame: Frame) -> Self {
        Self { frame }
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MediaError> {
        Ok(Self::new(Frame::open(path.into())?))
    }
}

impl VideoSource for StillCamera {
    fn preview(&mut self, _at: Instant) -> Option<Frame> {
        Some(self.frame.clone())
    }

    fn capture_frame(&mut self, _at: Instant) -> Option<Frame> {
        Some(self.frame.clone())
    }
}

const PATTERN_REFRESH: Duration = Duration::from_millis(33);

/// Animated test card: a soft gradient with drifting diagonal bands and an
/// orbiting bright disc, so both light and dark crossings show up.
///
/// Animation time counts from the first frame requested.
#[derive(Debug)]
pub struct PatternCamera {
    width: u32,
    height: u32,
    started: Option<Instant>,
    cached: Option<(Instant, Frame)>,
}

impl PatternCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            started: None,
            cached: None,
        }
    }

    /// The card at `t` seconds into the animation.
    pub fn render_at(width: u32, height: u32, t: f32) -> Frame {
        let (w, h) = (width as f32, height as f32);
        let orbit_x = w * (0.5 + 0.3 * (t * 0.7).cos());
        let orbit_y = h * (0.5 + 0.3 * (t * 0.9).sin());
        let radius = w.min(h) * 0.18;
        RgbaImage::from_fn(width, height, |x, y| {
            let (fx, fy) = (x as f32, y as f32);
            let band = (((fx + fy) * 0.04 - t * 2.0).sin() * 0.5 + 0.5) * 90.0;
            let base_r = 40.0 + 120.0 * fx / w;
            let base_g = 50.0 + 100.0 * fy / h;
            let base_b = 110.0;
            let d = ((fx - orbit_x).powi(2) + (fy - orbit_y).powi(2)).sqrt();
            let glow = if d < radius {
                150.0 * (1.0 - d / radius)
            } else {
                0.0
            };
            let ch = |base: f32| (base + band + glow).clamp(0.0, 255.0) as u8;
            Rgba([ch(base_r), ch(base_g), ch(base_b), 255])
        })
        .into()
    }

    fn frame_at(&mut self, at: Instant) -> Frame {
        match &self.cached {
            Some((rendered, frame))
                if at >= *rendered && at.duration_since(*rendered) < PATTERN_REFRESH =>
            {
                return frame.clone();
            }
            _ => {}
        }
        let started = *self.started.get_or_insert(at);
        let t = at.saturating_duration_since(started).as_secs_f32();
        let frame = Self::render_at(self.width, self.height, t);
        self.cached = Some((at, frame.clone()));
        frame
    }
}

impl VideoSource for PatternCamera {
    fn preview(&mut self, at: Instant) -> Option<Frame> {
        Some(self.frame_at(at))
    }

    fn capture_frame(&mut self, at: Instant) -> Option<Frame> {
        Some(self.frame_at(at))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentInput;

impl AudioInput for SilentInput {
    fn level(&mut self) -> f32 {
        0.0
    }
}

/// Bounded random walk that looks enough like room noise for the meter.
#[derive(Debug)]
pub struct WanderingInput {
    rng: StdRng,
    level: f32,
}

impl WanderingInput {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng, level: 0.2 }
    }
}

impl AudioInput for WanderingInput {
    fn level(&mut self) -> f32 {
        let step = self.rng.random_range(-0.05..0.05);
        self.level = (self.level + step).clamp(0.0, 1.0);
        if self.rng.random_bool(0.02) {
            // Occasional spike.
            return (self.level + 0.5).min(1.0);
        }
        self.level
    }
}

/// Devices described by the configuration file.
#[derive(Debug, Clone)]
pub struct ConfiguredDevices {
    camera: CameraConfig,
    microphone: MicrophoneKind,
    seed: Option<u64>,
}

impl ConfiguredDevices {
    pub fn from_config(cfg: &Configuration) -> Self {
        Self {
            camera: cfg.camera.clone(),
            microphone: cfg.microphone.kind,
            seed: cfg.seed,
        }
    }
}

impl MediaDevices for ConfiguredDevices {
    fn open_camera(&mut self) -> Result<Box<dyn VideoSource>, MediaError> {
        match self.camera.kind {
            CameraKind::Pattern => {
                debug!(
                    width = self.camera.width,
                    height = self.camera.height,
                    "opening pattern camera"
                );
                Ok(Box::new(PatternCamera::new(
                    self.camera.width,
                    self.camera.height,
                )))
            }
            CameraKind::Still => {
                let path = self.camera.path.clone().ok_or_else(|| {
                    MediaError::CameraUnavailable("no image path configured".into())
                })?;
                debug!(path = %path.display(), "opening still camera");
                Ok(Box::new(StillCamera::open(path)?))
            }
        }
    }

    fn open_microphone(&mut self) -> Result<Box<dyn AudioInput>, MediaError> {
        match self.microphone {
            MicrophoneKind::Silent => Ok(Box::new(SilentInput)),
            MicrophoneKind::Synthetic => Ok(Box::new(WanderingInput::new(self.seed))),
            #[cfg(feature = "microphone")]
            MicrophoneKind::System => Ok(Box::new(system_mic::SystemMicrophone::open()?)),
            #[cfg(not(feature = "microphone"))]
            MicrophoneKind::System => Err(MediaError::MicrophoneUnavailable(
                "built without the `microphone` feature".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_card_has_light_and_dark_regions() {
        let frame = PatternCamera::render_at(64, 48, 0.0);
        assert_eq!((frame.width(), frame.height()), (64, 48));
        let lum = |px: [u8; 4]| (u32::from(px[0]) + u32::from(px[1]) + u32::from(px[2])) / 3;
        let values: Vec<u32> = (0..64)
            .flat_map(|x| (0..48).map(move |y| (x, y)))
            .filter_map(|(x, y)| frame.pixel(x, y))
            .map(lum)
            .collect();
        assert!(values.iter().any(|&v| v > 128));
        assert!(values.iter().any(|&v| v <= 128));
    }

    #[test]
    fn pattern_camera_follows_the_given_clock() {
        let t0 = Instant::now();
        let later = t0 + Duration::from_millis(1500);
        let mut a = PatternCamera::new(32, 24);
        let mut b = PatternCamera::new(32, 24);
        a.preview(t0);
        b.preview(t0);
        let fa = a.capture_frame(later).unwrap();
        let fb = b.capture_frame(later).unwrap();
        assert_eq!(fa.pixels(), fb.pixels());
        assert_eq!(fa.pixels(), PatternCamera::render_at(32, 24, 1.5).pixels());
        // Within the refresh window the cached frame is handed back.
        let again = a.preview(later + Duration::from_millis(5)).unwrap();
        assert!(again.same_pixels(&fa));
    }

    #[test]
    fn wandering_input_stays_in_unit_range() {
        let mut mic = WanderingInput::new(Some(11));
        for _ in 0..1000 {
            let level = mic.level();
            assert!((0.0..=1.0).contains(&level));
        }
    }

    #[test]
    fn still_camera_without_path_is_unavailable() {
        let mut cfg = Configuration::default();
        cfg.camera.kind = CameraKind::Still;
        cfg.camera.path = None;
        let mut devices = ConfiguredDevices::from_config(&cfg);
        assert!(matches!(
            devices.open_camera(),
            Err(MediaError::CameraUnavailable(_))
        ));
    }

    #[test]
    fn missing_still_image_reports_load_error() {
        let mut cfg = Configuration::default();
        cfg.camera.kind = CameraKind::Still;
        cfg.camera.path = Some("/definitely/not/here.png".into());
        let mut devices = ConfiguredDevices::from_config(&cfg);
        assert!(matches!(
            devices.open_camera(),
            Err(MediaError::ImageLoad { .. })
        ));
    }

    #[cfg(not(feature = "microphone"))]
    #[test]
    fn system_microphone_needs_feature() {
        let mut cfg = Configuration::default();
        cfg.microphone.kind = MicrophoneKind::System;
        let mut devices = ConfiguredDevices::from_config(&cfg);
        assert!(matches!(
            devices.open_microphone(),
            Err(MediaError::MicrophoneUnavailable(_))
        ));
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Session length and capture cadence.
    pub session: SessionConfig,
    /// Thread grid geometry and animation constants.
    pub tapestry: TapestryOptions,
    /// Video collaborator used for previews and captures.
    pub camera: CameraConfig,
    /// Audio collaborator feeding the level meter.
    pub microphone: MicrophoneConfig,
    /// Window placement and frame pacing.
    pub window: WindowConfig,
    /// Headless run parameters (`--simulate`).
    pub simulation: SimulationConfig,
    /// Image woven before the first capture; a striped card when unset.
    pub placeholder_path: Option<PathBuf>,
    /// Deterministic seed for noise phases, thread jitter and grain.
    pub seed: Option<u64>,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        self.session.validate().context("invalid session timing")?;
        self.tapestry.validate().context("invalid tapestry options")?;
        self.camera.validate().context("invalid camera configuration")?;
        ensure!(
            self.microphone.smoothing > 0.0 && self.microphone.smoothing <= 1.0,
            "microphone.smoothing must be in (0, 1]"
        );
        ensure!(
            self.window.frame_rate > 0,
            "window.frame-rate must be greater than zero"
        );
        ensure!(
            self.simulation.frame_rate > 0,
            "simulation.frame-rate must be greater than zero"
        );
        ensure!(
            self.simulation.canvas_width > 0 && self.simulation.canvas_height > 0,
            "simulation canvas dimensions must be non-zero"
        );
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            tapestry: TapestryOptions::default(),
            camera: CameraConfig::default(),
            microphone: MicrophoneConfig::default(),
            window: WindowConfig::default(),
            simulation: SimulationConfig::default(),
            placeholder_path: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SessionConfig {
    /// Whole documentation window.
    #[serde(with = "humantime_serde")]
    pub total_duration: Duration,
    /// Time between two captures; must divide `total-duration`.
    #[serde(with = "humantime_serde")]
    pub capture_interval: Duration,
}

impl SessionConfig {
    /// Number of snapshots one session produces.
    pub fn total_captures(&self) -> usize {
        let interval = self.capture_interval.as_millis();
        if interval == 0 {
            return 0;
        }
        (self.total_duration.as_millis() / interval) as usize
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.capture_interval.is_zero(),
            "session.capture-interval must be greater than zero"
        );
        ensure!(
            self.total_duration >= self.capture_interval,
            "session.total-duration must be at least one capture-interval"
        );
        ensure!(
            self.total_duration.as_millis() % self.capture_interval.as_millis() == 0,
            "session.total-duration ({}) must be a whole multiple of capture-interval ({})",
            humantime::format_duration(self.total_duration),
            humantime::format_duration(self.capture_interval)
        );
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_duration: Duration::from_secs(60),
            capture_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TapestryOptions {
    /// Distance between neighbouring threads, in canvas pixels.
    pub spacing: f32,
    /// Nominal thread thickness.
    pub thread_width: f32,
    /// Amplitude of the sinusoidal thread drift.
    pub wobble: f32,
    /// Luminance above which the weft shows on top.
    pub threshold: f32,
    /// Half-width of the noise jitter before scaling.
    pub jitter_range: f32,
    /// Multiplier turning jitter into luminance units.
    pub jitter_scale: f32,
    /// Per-frame fraction of the remaining pan distance covered.
    pub pan_smoothing: f32,
    /// One-pixel specks scattered over each frame.
    pub grain_count: usize,
    /// Animation time advanced per frame.
    pub time_step: f32,
    /// Weave the live camera preview while waiting instead of the placeholder.
    pub weave_live_preview: bool,
}

impl TapestryOptions {
    fn validate(&self) -> Result<()> {
        ensure!(self.spacing >= 1.0, "tapestry.spacing must be at least 1");
        ensure!(
            self.thread_width > 0.0,
            "tapestry.thread-width must be positive"
        );
        ensure!(
            self.pan_smoothing > 0.0 && self.pan_smoothing <= 1.0,
            "tapestry.pan-smoothing must be in (0, 1]"
        );
        ensure!(
            self.jitter_range >= 0.0,
            "tapestry.jitter-range must not be negative"
        );
        ensure!(self.time_step >= 0.0, "tapestry.time-step must not be negative");
        Ok(())
    }
}

impl Default for TapestryOptions {
    fn default() -> Self {
        Self {
            spacing: 32.0,
            thread_width: 6.0,
            wobble: 6.0,
            threshold: 128.0,
            jitter_range: 0.3,
            jitter_scale: 30.0,
            pan_smoothing: 0.12,
            grain_count: 400,
            time_step: 0.01,
            weave_live_preview: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraKind {
    /// Procedurally animated test card.
    Pattern,
    /// A single image file standing in for the camera.
    Still,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CameraConfig {
    #[serde(rename = "type")]
    pub kind: CameraKind,
    /// Image file for `type: still`.
    pub path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
}

impl CameraConfig {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "camera.width and camera.height must be non-zero"
        );
        if self.kind == CameraKind::Still {
            ensure!(self.path.is_some(), "camera.path is required for type: still");
        }
        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            kind: CameraKind::Pattern,
            path: None,
            width: 640,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MicrophoneKind {
    Silent,
    Synthetic,
    /// System default input (requires the `microphone` feature).
    System,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MicrophoneConfig {
    #[serde(rename = "type")]
    pub kind: MicrophoneKind,
    /// Per-frame easing applied to the raw input level.
    pub smoothing: f32,
}

impl Default for MicrophoneConfig {
    fn default() -> Self {
        Self {
            kind: MicrophoneKind::Synthetic,
            smoothing: 0.1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    /// Target redraws per second.
    pub frame_rate: u32,
}

impl WindowConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Tapestry Capture".to_string(),
            width: 1280,
            height: 800,
            fullscreen: false,
            frame_rate: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SimulationConfig {
    /// Virtual frames per second.
    pub frame_rate: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30,
            canvas_width: 640,
            canvas_height: 400,
        }
    }
}

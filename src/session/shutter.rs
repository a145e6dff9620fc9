/// Frames a flash stays on screen after a capture.
pub const SHUTTER_FRAMES: u8 = 10;
/// Overlay alpha per intensity step.
pub const SHUTTER_ALPHA_STEP: u8 = 25;

/// Countdown for the white flash drawn after each capture.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shutter {
    remaining: u8,
}

impl Shutter {
    pub fn trigger(&mut self) {
        self.remaining = SHUTTER_FRAMES;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// Intensity for the frame about to be drawn, counting down to 1.
    pub fn next_frame(&mut self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }
        let intensity = self.remaining;
        self.remaining -= 1;
        Some(intensity)
    }
}

pub fn overlay_alpha(intensity: u8) -> u8 {
    intensity.saturating_mul(SHUTTER_ALPHA_STEP)
}

use chrono::{DateTime, Utc};

use crate::frame::Frame;
use crate::tapestry::Vec2;

use super::gallery::Snapshot;

/// Interaction collected between two captures.
#[derive(Debug, Clone, Default)]
pub struct InteractionAccumulator {
    samples: Vec<Vec2>,
    clicks: u32,
    keys: u32,
}

impl InteractionAccumulator {
    pub fn record_pointer(&mut self, position: Vec2) {
        self.samples.push(position);
    }

    pub fn record_click(&mut self) {
        self.clicks = self.clicks.saturating_add(1);
    }

    pub fn record_key(&mut self) {
        self.keys = self.keys.saturating_add(1);
    }

    pub fn samples(&self) -> &[Vec2] {
        &self.samples
    }

    pub fn clicks(&self) -> u32 {
        self.clicks
    }

    pub fn keys(&self) -> u32 {
        self.keys
    }

    /// Arithmetic mean of the pointer samples.
    pub fn mean_pointer(&self) -> Option<Vec2> {
        if self.samples.is_empty() {
            return None;
        }
        let n = self.samples.len() as f64;
        let (sx, sy) = self.samples.iter().fold((0.0f64, 0.0f64), |(sx, sy), p| {
            (sx + f64::from(p.x), sy + f64::from(p.y))
        });
        Some(Vec2::new((sx / n) as f32, (sy / n) as f32))
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.clicks = 0;
        self.keys = 0;
    }
}

/// Turns the running interaction counters into snapshots.
#[derive(Debug, Default)]
pub struct CaptureAggregator {
    current: InteractionAccumulator,
}

impl CaptureAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interaction(&self) -> &InteractionAccumulator {
        &self.current
    }

    pub fn interaction_mut(&mut self) -> &mut InteractionAccumulator {
        &mut self.current
    }

    /// Freezes the current interval into a snapshot and starts a new one.
    pub fn materialize(
        &mut self,
        index: usize,
        captured_at: DateTime<Utc>,
        photo: Frame,
        mic_level: f32,
    ) -> Snapshot {
        let snapshot = Snapshot {
            index,
            captured_at,
            photo,
            mean_pointer: self.current.mean_pointer(),
            clicks: self.current.clicks(),
            keys: self.current.keys(),
            mic_level,
        };
        self.current.reset();
        snapshot
    }

    pub fn reset(&mut self) {
        self.current.reset();
    }
}

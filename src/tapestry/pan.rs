use std::ops::{Add, Mul, Sub};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// Drag-driven translation of the woven picture.
///
/// Input moves `target`; `current` eases toward it once per frame, before
/// anything is drawn.
#[derive(Debug, Clone)]
pub struct PanOffset {
    target: Vec2,
    current: Vec2,
    smoothing: f32,
}

impl PanOffset {
    pub fn new(smoothing: f32) -> Self {
        Self {
            target: Vec2::ZERO,
            current: Vec2::ZERO,
            smoothing,
        }
    }

    pub fn nudge(&mut self, delta: Vec2) {
        self.target = self.target + delta;
    }

    pub fn step(&mut self) {
        self.current = self.current + (self.target - self.current) * self.smoothing;
    }

    pub fn current(&self) -> Vec2 {
        self.current
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }
}

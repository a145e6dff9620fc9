use rand::Rng;

/// Phases are drawn uniformly from `[0, PHASE_RANGE)`.
pub const PHASE_RANGE: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Vertical threads, one per column.
    Warp,
    /// Horizontal threads, one per row.
    Weft,
}

/// Per-thread phase offsets that keep each line's drift independent.
///
/// Phases are only ever appended: a thread keeps its phase for the life of
/// the field, so resizing the canvas never makes existing threads jump.
#[derive(Debug, Clone, Default)]
pub struct NoiseField {
    warp: Vec<f32>,
    weft: Vec<f32>,
}

impl NoiseField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_size<R: Rng + ?Sized>(&mut self, axis: Axis, n: usize, rng: &mut R) {
        let phases = self.axis_mut(axis);
        while phases.len() < n {
            phases.push(rng.random_range(0.0..PHASE_RANGE));
        }
    }

    pub fn phase_at(&self, axis: Axis, index: usize) -> f32 {
        self.axis(axis).get(index).copied().unwrap_or(0.0)
    }

    pub fn len(&self, axis: Axis) -> usize {
        self.axis(axis).len()
    }

    pub fn is_empty(&self) -> bool {
        self.warp.is_empty() && self.weft.is_empty()
    }

    fn axis(&self, axis: Axis) -> &[f32] {
        match axis {
            Axis::Warp => &self.warp,
            Axis::Weft => &self.weft,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut Vec<f32> {
        match axis {
            Axis::Warp => &mut self.warp,
            Axis::Weft => &mut self.weft,
        }
    }
}

/// Smooth lattice value noise in `[0, 1)`.
///
/// Stateless: the same coordinates always give the same value, which keeps
/// each crossing's threshold jitter stable between the two weaving passes.
pub fn value_noise(x: f32, y: f32, z: f32) -> f32 {
    let (x0, y0, z0) = (x.floor(), y.floor(), z.floor());
    let (fx, fy, fz) = (fade(x - x0), fade(y - y0), fade(z - z0));
    let (ix, iy, iz) = (x0 as i32, y0 as i32, z0 as i32);

    let corner = |dx: i32, dy: i32, dz: i32| lattice(ix + dx, iy + dy, iz + dz);

    let x00 = lerp(corner(0, 0, 0), corner(1, 0, 0), fx);
    let x10 = lerp(corner(0, 1, 0), corner(1, 1, 0), fx);
    let x01 = lerp(corner(0, 0, 1), corner(1, 0, 1), fx);
    let x11 = lerp(corner(0, 1, 1), corner(1, 1, 1), fx);
    let y0v = lerp(x00, x10, fy);
    let y1v = lerp(x01, x11, fy);
    lerp(y0v, y1v, fz).clamp(0.0, LATTICE_MAX)
}

const LATTICE_MAX: f32 = 1.0 - f32::EPSILON;

fn lattice(x: i32, y: i32, z: i32) -> f32 {
    let mut h = (x as u32).wrapping_mul(0x8da6_b343)
        ^ (y as u32).wrapping_mul(0xd816_3841)
        ^ (z as u32).wrapping_mul(0xcb1a_b31f);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2c1b_3c6d);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297a_2d39);
    h ^= h >> 15;
    (h >> 8) as f32 / (1u32 << 24) as f32
}

fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

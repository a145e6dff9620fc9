use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::session::timer::TimerId;

/// A moment as seen by the session: the monotonic instant drives timers and
/// countdowns, the wall clock stamps snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub at: Instant,
    pub wall: DateTime<Utc>,
}

impl Tick {
    pub fn now() -> Self {
        Self {
            at: Instant::now(),
            wall: Utc::now(),
        }
    }

    /// The same clock moved forward by `elapsed`.
    pub fn after(self, elapsed: Duration) -> Self {
        let wall = chrono::Duration::from_std(elapsed)
            .ok()
            .and_then(|d| self.wall.checked_add_signed(d))
            .unwrap_or(self.wall);
        Self {
            at: self.at + elapsed,
            wall,
        }
    }
}

/// Messages delivered to the viewer's event loop from outside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// A repeating capture timer fired.
    CaptureTick(TimerId),
    /// Shutdown was requested (ctrl-c).
    Cancelled,
}

/// Pointer and keyboard input, already translated out of the windowing
/// toolkit's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMoved { x: f32, y: f32 },
    PointerPressed,
    PointerReleased,
    KeyPressed,
}

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingPermission,
    Waiting,
    Capturing,
    Browsing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStateChange {
    pub from: SessionState,
    pub to: SessionState,
}

/// Lifecycle of one documentation session.
///
/// Only forward moves are accepted; everything else returns `None` and
/// leaves the state untouched.
pub struct SessionSM {
    state: SessionState,
    entered_at: Instant,
}

impl SessionSM {
    pub fn new(now: Instant) -> Self {
        Self {
            state: SessionState::AwaitingPermission,
            entered_at: now,
        }
    }

    pub fn current(&self) -> SessionState {
        self.state
    }

    pub fn entered_at(&self) -> Instant {
        self.entered_at
    }

    /// Devices were requested (successfully or not).
    pub fn on_activated(&mut self, now: Instant) -> Option<SessionStateChange> {
        if self.state == SessionState::AwaitingPermission {
            return self.goto(SessionState::Waiting, now);
        }
        None
    }

    /// The user asked to start recording.
    pub fn on_start(&mut self, now: Instant) -> Option<SessionStateChange> {
        if self.state == SessionState::Waiting {
            return self.goto(SessionState::Capturing, now);
        }
        None
    }

    /// The last snapshot of the session was taken.
    pub fn on_finished(&mut self, now: Instant) -> Option<SessionStateChange> {
        if self.state == SessionState::Capturing {
            return self.goto(SessionState::Browsing, now);
        }
        None
    }

    fn goto(&mut self, to: SessionState, now: Instant) -> Option<SessionStateChange> {
        if self.state == to {
            return None;
        }
        let ch = SessionStateChange {
            from: self.state,
            to,
        };
        self.state = to;
        self.entered_at = now;
        Some(ch)
    }
}

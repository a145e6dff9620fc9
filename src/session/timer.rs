use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Identifies one armed repeating timer. Ids are never reused, so a tick
/// carrying the id of a cancelled timer can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Arms and cancels the repeating capture timer.
///
/// Implementations deliver ticks out of band (an event-loop message, a
/// polled queue); the session only hands out periods and checks ids.
pub trait CaptureScheduler {
    /// Starts a timer firing every `period`, first at `now + period`.
    fn arm(&mut self, period: Duration, now: Instant) -> TimerId;

    /// Stops the timer. Unknown or already cancelled ids are a no-op.
    fn cancel(&mut self, id: TimerId);
}

impl<S: CaptureScheduler + ?Sized> CaptureScheduler for Box<S> {
    fn arm(&mut self, period: Duration, now: Instant) -> TimerId {
        (**self).arm(period, now)
    }

    fn cancel(&mut self, id: TimerId) {
        (**self).cancel(id)
    }
}

#[derive(Debug, Clone, Copy)]
struct ManualTimer {
    period: Duration,
    next_due: Instant,
}

/// Virtual-time scheduler: nothing fires until [`ManualScheduler::poll`] is
/// called with a later instant.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    timers: BTreeMap<TimerId, ManualTimer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of every tick due at or before `now`, oldest first. A timer that
    /// is several periods behind yields one id per missed period.
    pub fn poll(&mut self, now: Instant) -> Vec<TimerId> {
        let mut due: Vec<(Instant, TimerId)> = Vec::new();
        for (id, timer) in self.timers.iter_mut() {
            if timer.period.is_zero() {
                continue;
            }
            while timer.next_due <= now {
                due.push((timer.next_due, *id));
                timer.next_due += timer.period;
            }
        }
        due.sort();
        due.into_iter().map(|(_, id)| id).collect()
    }

    /// When the earliest armed timer fires next.
    pub fn next_due(&self) -> Option<Instant> {
        self.timers.values().map(|t| t.next_due).min()
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }
}

impl CaptureScheduler for ManualScheduler {
    fn arm(&mut self, period: Duration, now: Instant) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.insert(
            id,
            ManualTimer {
                period,
                next_due: now + period,
            },
        );
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_per_elapsed_period() {
        let t0 = Instant::now();
        let mut sched = ManualScheduler::new();
        let id = sched.arm(Duration::from_secs(5), t0);

        assert!(sched.poll(t0 + Duration::from_secs(4)).is_empty());
        assert_eq!(sched.poll(t0 + Duration::from_secs(5)), vec![id]);
        assert!(sched.poll(t0 + Duration::from_secs(5)).is_empty());
        assert_eq!(sched.poll(t0 + Duration::from_secs(16)), vec![id, id]);
        assert_eq!(sched.next_due(), Some(t0 + Duration::from_secs(20)));
    }

    #[test]
    fn cancelled_timer_stays_silent() {
        let t0 = Instant::now();
        let mut sched = ManualScheduler::new();
        let id = sched.arm(Duration::from_secs(1), t0);
        sched.cancel(id);
        assert!(!sched.is_active(id));
        assert_eq!(sched.active_count(), 0);
        assert!(sched.poll(t0 + Duration::from_secs(10)).is_empty());
        sched.cancel(id);
    }

    #[test]
    fn ids_are_not_reused() {
        let t0 = Instant::now();
        let mut sched = ManualScheduler::new();
        let a = sched.arm(Duration::from_secs(1), t0);
        sched.cancel(a);
        let b = sched.arm(Duration::from_secs(1), t0);
        assert_ne!(a, b);
    }
}

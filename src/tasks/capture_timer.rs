use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::select;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use winit::event_loop::EventLoopProxy;

use crate::events::AppEvent;
use crate::session::{CaptureScheduler, TimerId};

/// Where interval tasks deliver their ticks.
pub trait TickSink: Clone + Send + 'static {
    /// Returns `false` once the receiving side is gone.
    fn deliver(&self, id: TimerId) -> bool;
}

impl TickSink for EventLoopProxy<AppEvent> {
    fn deliver(&self, id: TimerId) -> bool {
        self.send_event(AppEvent::CaptureTick(id)).is_ok()
    }
}

impl TickSink for UnboundedSender<TimerId> {
    fn deliver(&self, id: TimerId) -> bool {
        self.send(id).is_ok()
    }
}

/// Capture timers backed by tokio interval tasks.
///
/// Each armed timer is its own task holding a child of the scheduler's
/// cancellation token. Tasks only forward ids; the session decides what a
/// tick means, and drops ids that are no longer armed.
pub struct IntervalScheduler<T: TickSink> {
    handle: Handle,
    sink: T,
    cancel: CancellationToken,
    next_id: u64,
    timers: HashMap<TimerId, CancellationToken>,
}

impl<T: TickSink> IntervalScheduler<T> {
    pub fn new(handle: Handle, sink: T, cancel: CancellationToken) -> Self {
        Self {
            handle,
            sink,
            cancel,
            next_id: 0,
            timers: HashMap::new(),
        }
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

impl<T: TickSink> CaptureScheduler for IntervalScheduler<T> {
    fn arm(&mut self, period: Duration, now: Instant) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let token = self.cancel.child_token();
        self.timers.insert(id, token.clone());

        let sink = self.sink.clone();
        let period = period.max(Duration::from_millis(1));
        let start = tokio::time::Instant::from_std(now) + period;
        self.handle.spawn(async move {
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !sink.deliver(id) {
                            break;
                        }
                    }
                }
            }
            debug!(?id, "capture timer stopped");
        });
        debug!(?id, period = %humantime::format_duration(period), "capture timer armed");
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(token) = self.timers.remove(&id) {
            token.cancel();
        }
    }
}

impl<T: TickSink> Drop for IntervalScheduler<T> {
    fn drop(&mut self) {
        for (_, token) in self.timers.drain() {
            token.cancel();
        }
    }
}

//! `Timer` and `ConditionalTimer`: Observable-like interval sources (spec
//! §4.9).

use crate::event::{Event, TerminationReason};
use crate::node::flavor::{FlavorHooks, FlavorKind, ReplayPolicy};
use crate::node::StreamNode;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

struct TimerHooks;

impl<T, Err> FlavorHooks<T, Err> for TimerHooks {
    fn kind(&self) -> FlavorKind {
        FlavorKind::Observable
    }

    fn default_replay(&self) -> ReplayPolicy {
        ReplayPolicy::REPLAY
    }
}

/// An interval source emitting `()` every `interval`. Call `.count()` on
/// [`stream`](Self::stream) for a monotonically increasing tick counter
/// instead.
pub struct Timer {
    node: Arc<StreamNode<(), String>>,
    interval: Mutex<Duration>,
    handle: Handle,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Timer {
    pub fn new(descriptor: impl Into<String>, interval: Duration, handle: Handle) -> Self {
        Timer {
            node: StreamNode::new_root(descriptor, Box::new(TimerHooks)),
            interval: Mutex::new(interval),
            handle,
            task: Mutex::new(None),
        }
    }

    /// The stream handle to attach operators on.
    pub fn stream(&self) -> Arc<StreamNode<(), String>> {
        self.node.clone()
    }

    /// Begin ticking. If `delay_first` is `false`, the first tick fires
    /// immediately instead of after the first full interval.
    pub fn start(&self, delay_first: bool) {
        self.spawn_loop(delay_first);
    }

    /// Replace the pending schedule with a new interval, restarting the
    /// wait from now.
    pub fn restart(&self, with_interval: Duration) {
        *self.interval.lock() = with_interval;
        self.spawn_loop(true);
    }

    /// Pause ticking without terminating the stream; `start` resumes it.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
    }

    /// Finish the stream for good.
    pub fn terminate(&self, reason: TerminationReason<String>) {
        self.stop();
        self.node.ingest(Event::Terminate(reason));
    }

    fn spawn_loop(&self, delay_first: bool) {
        self.stop();
        let node = self.node.clone();
        let interval = *self.interval.lock();
        let task = self.handle.spawn(async move {
            if delay_first {
                tokio::time::sleep(interval).await;
            }
            loop {
                if !node.is_active() {
                    return;
                }
                node.ingest(Event::Next(()));
                tokio::time::sleep(interval).await;
            }
        });
        *self.task.lock() = Some(task);
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A [`Timer`] paired with an atomic tick counter, for the common
/// `.count()` usage (spec §4.9).
pub struct CountingTimer {
    timer: Timer,
    counted: Arc<StreamNode<u64, String>>,
}

impl CountingTimer {
    pub fn new(descriptor: impl Into<String>, interval: Duration, handle: Handle) -> Self {
        let timer = Timer::new(descriptor, interval, handle);
        let count = Arc::new(AtomicU64::new(0));
        let counted = timer.stream().attach("timer_count", Box::new(TimerHooks), move |_prior, ev: &Event<(), String>| match ev {
            Event::Next(()) => crate::signal::Signal::push(count.fetch_add(1, Ordering::SeqCst) + 1),
            Event::Error(e) => crate::signal::Signal::Error(e.clone()),
            Event::Terminate(r) => crate::signal::Signal::terminate(r.clone()),
        });
        CountingTimer { timer, counted }
    }

    /// The running tick count, starting at 1 on the first tick.
    pub fn stream(&self) -> Arc<StreamNode<u64, String>> {
        self.counted.clone()
    }

    pub fn start(&self, delay_first: bool) {
        self.timer.start(delay_first);
    }

    pub fn restart(&self, with_interval: Duration) {
        self.timer.restart(with_interval);
    }

    pub fn stop(&self) {
        self.timer.stop();
    }

    pub fn terminate(&self, reason: TerminationReason<String>) {
        self.timer.terminate(reason);
    }
}

/// A timer that fires only while `predicate` holds; the tick that returns
/// `false` becomes the last one, and the timer deactivates itself.
pub struct ConditionalTimer {
    timer: Timer,
    gated: Arc<StreamNode<(), String>>,
}

impl ConditionalTimer {
    pub fn new(
        descriptor: impl Into<String>,
        interval: Duration,
        handle: Handle,
        predicate: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        let timer = Timer::new(descriptor, interval, handle);
        let gated = timer.stream().attach("conditional_timer", Box::new(TimerHooks), move |_prior, ev: &Event<(), String>| {
            match ev {
                Event::Next(()) => {
                    if predicate() {
                        crate::signal::Signal::push(())
                    } else {
                        crate::signal::Signal::terminate(TerminationReason::Completed)
                    }
                }
                Event::Error(e) => crate::signal::Signal::Error(e.clone()),
                Event::Terminate(r) => crate::signal::Signal::terminate(r.clone()),
            }
        });
        ConditionalTimer { timer, gated }
    }

    /// The gated stream: ticks while the predicate holds, then completes.
    pub fn stream(&self) -> Arc<StreamNode<(), String>> {
        self.gated.clone()
    }

    pub fn start(&self, delay_first: bool) {
        self.timer.start(delay_first);
    }

    pub fn stop(&self) {
        self.timer.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_stream_is_observable_flavored_and_replays() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let timer = Timer::new("t", Duration::from_millis(10), rt.handle().clone());
        assert_eq!(timer.stream().flavor(), FlavorKind::Observable);
    }
}

//! Throttle strategies: `Timed`, `Stride`, `Pressure` (spec §4.8). A throttle
//! gates how often a unit of deferred work actually runs; it never inspects
//! or runs the work itself beyond that decision.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// Called by a unit of work exactly once, when it's done.
pub type Finish = Box<dyn FnOnce() + Send>;

/// A deferred action. Must call its `Finish` argument exactly once.
pub type ThrottledWork = Box<dyn FnOnce(Finish) + Send>;

/// What a throttle decided about one submitted [`ThrottledWork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// The work will run (now, or once its turn comes).
    Perform,
    /// The work was discarded without running.
    DropWork,
}

fn no_finish() -> Finish {
    Box::new(|| {})
}

/// Gates how often deferred work is allowed to run.
pub trait Throttle: Send + Sync {
    fn process(&self, work: ThrottledWork) -> ThrottleDecision;
}

struct TimedState {
    pending: Option<ThrottledWork>,
    scheduled: bool,
    first_tick: bool,
}

/// Coalescing time-window throttle: at most one work survives per
/// `interval`; a newer submission replaces whatever's buffered.
pub struct Timed {
    interval: Duration,
    delay_first: bool,
    handle: Handle,
    state: Arc<Mutex<TimedState>>,
}

impl Timed {
    pub fn new(interval: Duration, delay_first: bool, handle: Handle) -> Self {
        Timed {
            interval,
            delay_first,
            handle,
            state: Arc::new(Mutex::new(TimedState {
                pending: None,
                scheduled: false,
                first_tick: true,
            })),
        }
    }

    /// Run until the buffer goes dry, then close the window; the next
    /// `process()` call reopens one.
    fn open_window(&self) {
        let state = self.state.clone();
        let interval = self.interval;
        self.handle.spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let work = {
                    let mut s = state.lock();
                    s.pending.take()
                };
                match work {
                    Some(w) => w(no_finish()),
                    None => {
                        state.lock().scheduled = false;
                        break;
                    }
                }
            }
        });
    }
}

impl Throttle for Timed {
    fn process(&self, work: ThrottledWork) -> ThrottleDecision {
        let mut state = self.state.lock();
        if state.first_tick {
            state.first_tick = false;
            if !self.delay_first {
                drop(state);
                work(no_finish());
                self.state.lock().scheduled = true;
                self.open_window();
                return ThrottleDecision::Perform;
            }
        }
        let had_previous = state.pending.replace(work).is_some();
        if !state.scheduled {
            state.scheduled = true;
            drop(state);
            self.open_window();
        }
        if had_previous {
            ThrottleDecision::DropWork
        } else {
            ThrottleDecision::Perform
        }
    }
}

/// Passes every `n`th submission; drops the rest.
pub struct Stride {
    n: usize,
    count: AtomicUsize,
}

impl Stride {
    pub fn new(n: usize) -> Self {
        Stride {
            n: n.max(1),
            count: AtomicUsize::new(0),
        }
    }
}

impl Throttle for Stride {
    fn process(&self, work: ThrottledWork) -> ThrottleDecision {
        let i = self.count.fetch_add(1, Ordering::SeqCst);
        if i % self.n == 0 {
            work(no_finish());
            ThrottleDecision::Perform
        } else {
            ThrottleDecision::DropWork
        }
    }
}

struct PressureState {
    in_flight: usize,
    queue: VecDeque<ThrottledWork>,
    buffer: usize,
}

/// At most `limit` concurrent works in flight; excess goes to a FIFO of
/// capacity `buffer`, overflow is dropped. A completing work pulls the next
/// buffered one under the same lock.
pub struct Pressure {
    limit: usize,
    state: Arc<Mutex<PressureState>>,
}

impl Pressure {
    pub fn new(buffer: usize, limit: usize) -> Self {
        Pressure {
            limit,
            state: Arc::new(Mutex::new(PressureState {
                in_flight: 0,
                queue: VecDeque::new(),
                buffer,
            })),
        }
    }

    fn dispatch(state: Arc<Mutex<PressureState>>, work: ThrottledWork) {
        let state2 = state.clone();
        let finish: Finish = Box::new(move || {
            let next = {
                let mut s = state2.lock();
                s.in_flight -= 1;
                s.queue.pop_front()
            };
            if let Some(w) = next {
                state2.lock().in_flight += 1;
                Pressure::dispatch(state2.clone(), w);
            }
        });
        work(finish);
    }
}

impl Throttle for Pressure {
    fn process(&self, work: ThrottledWork) -> ThrottleDecision {
        let mut state = self.state.lock();
        if state.in_flight < self.limit {
            state.in_flight += 1;
            drop(state);
            Pressure::dispatch(self.state.clone(), work);
            ThrottleDecision::Perform
        } else if state.queue.len() < state.buffer {
            state.queue.push_back(work);
            ThrottleDecision::Perform
        } else {
            ThrottleDecision::DropWork
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn stride_passes_every_nth() {
        let stride = Stride::new(3);
        let ran = Arc::new(AtomicUsize::new(0));
        let mut decisions = Vec::new();
        for _ in 0..6 {
            let ran = ran.clone();
            decisions.push(stride.process(Box::new(move |finish| {
                ran.fetch_add(1, Ordering::SeqCst);
                finish();
            })));
        }
        assert_eq!(ran.load(Ordering::SeqCst), 2);
        assert_eq!(
            decisions,
            vec![
                ThrottleDecision::Perform,
                ThrottleDecision::DropWork,
                ThrottleDecision::DropWork,
                ThrottleDecision::Perform,
                ThrottleDecision::DropWork,
                ThrottleDecision::DropWork,
            ]
        );
    }

    #[test]
    fn pressure_queues_past_the_limit_and_drops_past_the_buffer() {
        let pressure = Pressure::new(1, 1);
        let finishers: Arc<Mutex<Vec<Finish>>> = Arc::new(Mutex::new(Vec::new()));

        let stash = finishers.clone();
        let d1 = pressure.process(Box::new(move |finish| stash.lock().push(finish)));
        assert_eq!(d1, ThrottleDecision::Perform);

        let stash = finishers.clone();
        let d2 = pressure.process(Box::new(move |finish| stash.lock().push(finish)));
        assert_eq!(d2, ThrottleDecision::Perform); // buffered

        let d3 = pressure.process(Box::new(|_finish| {}));
        assert_eq!(d3, ThrottleDecision::DropWork); // buffer full

        let first = finishers.lock().remove(0);
        first();
        assert_eq!(finishers.lock().len(), 1); // the buffered one now ran
    }
}

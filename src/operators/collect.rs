//! Grouping operators: `first`, `last`, `buffer`, `window` (spec §4.3).

use crate::event::Event;
use crate::node::flavor::BaseHooks;
use crate::node::StreamNode;
use crate::signal::Signal;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

impl<T, Err> StreamNode<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// Emit only the first `n` values, then complete.
    pub fn first(self: &Arc<Self>, n: usize) -> Arc<StreamNode<T, Err>> {
        let seen = Arc::new(AtomicUsize::new(0));
        self.attach("first", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                let count = seen.fetch_add(1, Ordering::SeqCst) + 1;
                if count >= n {
                    Signal::Terminate(Some(v.clone()), crate::event::TerminationReason::Completed)
                } else {
                    Signal::push(v.clone())
                }
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Buffer the last `n` values and emit them as one array when the
    /// source terminates. If `partial` is `false`, a source that never
    /// produced `n` values emits nothing.
    pub fn last(self: &Arc<Self>, n: usize, partial: bool) -> Arc<StreamNode<Vec<T>, Err>> {
        let buf: Arc<Mutex<VecDeque<T>>> = Arc::new(Mutex::new(VecDeque::with_capacity(n)));
        self.attach("last", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                let mut buf = buf.lock();
                if buf.len() == n {
                    buf.pop_front();
                }
                buf.push_back(v.clone());
                Signal::Merging
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => {
                let buf = buf.lock();
                if buf.is_empty() || (!partial && buf.len() < n) {
                    Signal::terminate(r.clone())
                } else {
                    Signal::Terminate(Some(buf.iter().cloned().collect()), r.clone())
                }
            }
        })
    }

    /// Emit a `Vec<T>` every time `n` values have accumulated. If `partial`
    /// is `true`, a trailing group smaller than `n` is flushed when the
    /// source terminates.
    pub fn buffer(self: &Arc<Self>, n: usize, partial: bool) -> Arc<StreamNode<Vec<T>, Err>> {
        let buf: Arc<Mutex<Vec<T>>> = Arc::new(Mutex::new(Vec::with_capacity(n)));
        self.attach("buffer", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                let mut buf = buf.lock();
                buf.push(v.clone());
                if buf.len() == n {
                    Signal::push(std::mem::take(&mut *buf))
                } else {
                    Signal::Merging
                }
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => {
                let mut buf = buf.lock();
                if partial && !buf.is_empty() {
                    Signal::Terminate(Some(std::mem::take(&mut *buf)), r.clone())
                } else {
                    Signal::terminate(r.clone())
                }
            }
        })
    }

    /// Emit a rolling window of the last `n` values on every new value. If
    /// `partial` is `true`, windows smaller than `n` are emitted while the
    /// buffer is still filling up; otherwise nothing is emitted until the
    /// first full window.
    pub fn window(self: &Arc<Self>, n: usize, partial: bool) -> Arc<StreamNode<Vec<T>, Err>> {
        let buf: Arc<Mutex<VecDeque<T>>> = Arc::new(Mutex::new(VecDeque::with_capacity(n)));
        self.attach("window", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                let mut buf = buf.lock();
                if buf.len() == n {
                    buf.pop_front();
                }
                buf.push_back(v.clone());
                if partial || buf.len() == n {
                    Signal::push(buf.iter().cloned().collect())
                } else {
                    Signal::Merging
                }
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// Emit a rolling window of every value received within the last
    /// `duration`, capped at `limit` elements, on every new value.
    pub fn window_timed(self: &Arc<Self>, duration: Duration, limit: usize) -> Arc<StreamNode<Vec<T>, Err>> {
        let buf: Arc<Mutex<VecDeque<(Instant, T)>>> = Arc::new(Mutex::new(VecDeque::new()));
        self.attach("window_timed", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                let mut buf = buf.lock();
                let now = Instant::now();
                while buf.front().map_or(false, |(t, _)| now.duration_since(*t) > duration) {
                    buf.pop_front();
                }
                buf.push_back((now, v.clone()));
                while buf.len() > limit {
                    buf.pop_front();
                }
                Signal::push(buf.iter().map(|(_, v)| v.clone()).collect())
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }
}

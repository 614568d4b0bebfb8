//! Lifecycle operators: `defaultValue`, `doWhile`, `until`, `concat`,
//! `next(n, then)` (spec §4.3).

use crate::event::{Event, TerminationReason};
use crate::node::flavor::BaseHooks;
use crate::node::StreamNode;
use crate::signal::Signal;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

impl<T, Err> StreamNode<T, Err>
where
    T: Clone + Send + Sync + 'static,
    Err: Clone + Send + Sync + 'static,
{
    /// If this stream hasn't produced a value yet, synthesize `v` as its
    /// first one immediately.
    pub fn default_value(self: &Arc<Self>, v: T) -> Arc<StreamNode<T, Err>> {
        let had_value = self.last_value().is_some();
        let child = self.attach("default_value", Box::new(BaseHooks), |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => Signal::push(v.clone()),
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        });
        if !had_value {
            child.ingest(Event::Next(v));
        }
        child
    }

    /// Prepend `values` ahead of this stream's own events, emitted
    /// immediately in order before anything the parent has already buffered
    /// can arrive.
    pub fn start(self: &Arc<Self>, values: impl IntoIterator<Item = T>) -> Arc<StreamNode<T, Err>> {
        let child = self.attach("start", Box::new(BaseHooks), |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => Signal::push(v.clone()),
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        });
        for v in values {
            child.ingest(Event::Next(v));
        }
        child
    }

    /// Pass values through while `predicate` holds; the first value that
    /// fails it ends the stream as `Completed` without being emitted.
    pub fn do_while(self: &Arc<Self>, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Arc<StreamNode<T, Err>> {
        self.attach("do_while", Box::new(BaseHooks), move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => {
                if predicate(v) {
                    Signal::push(v.clone())
                } else {
                    Signal::terminate(TerminationReason::Completed)
                }
            }
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(r) => Signal::terminate(r.clone()),
        })
    }

    /// End this stream as soon as `stop` produces anything — a value, an
    /// error, or its own termination.
    pub fn until<S, StopErr>(self: &Arc<Self>, stop: &Arc<StreamNode<S, StopErr>>) -> Arc<StreamNode<T, Err>>
    where
        S: Clone + Send + Sync + 'static,
        StopErr: Clone + Send + Sync + 'static,
    {
        let child = StreamNode::new_root("until", Box::new(BaseHooks));
        let done = Arc::new(Mutex::new(false));

        {
            let child = child.clone();
            let done = done.clone();
            self.attach_existing(child.clone(), None, move |_prior, ev: &Event<T, Err>| {
                if *done.lock() {
                    return Signal::Merging;
                }
                match ev {
                    Event::Next(v) => Signal::push(v.clone()),
                    Event::Error(e) => Signal::Error(e.clone()),
                    Event::Terminate(r) => Signal::terminate(r.clone()),
                }
            });
        }
        {
            let child = child.clone();
            let done = done.clone();
            stop.attach_existing(child.clone(), None, move |_prior, _ev: &Event<S, StopErr>| {
                let mut done = done.lock();
                if *done {
                    Signal::Merging
                } else {
                    *done = true;
                    Signal::terminate(TerminationReason::Completed)
                }
            });
        }

        child
    }

    /// Run this stream to completion, then lazily build and run the stream
    /// `next` returns, from the start. `next` is only invoked if this
    /// stream completes normally; an error or cancellation ends the
    /// combined stream immediately without ever calling it (spec §4.3).
    pub fn concat(
        self: &Arc<Self>,
        next: impl FnOnce() -> Arc<StreamNode<T, Err>> + Send + 'static,
    ) -> Arc<StreamNode<T, Err>> {
        let child = StreamNode::new_root("concat", Box::new(BaseHooks));
        let next: Arc<Mutex<Option<Box<dyn FnOnce() -> Arc<StreamNode<T, Err>> + Send>>>> =
            Arc::new(Mutex::new(Some(Box::new(next))));
        let tail_target = child.clone();

        self.attach_existing(child.clone(), None, move |_prior, ev: &Event<T, Err>| match ev {
            Event::Next(v) => Signal::push(v.clone()),
            Event::Error(e) => Signal::Error(e.clone()),
            Event::Terminate(TerminationReason::Completed) => {
                if let Some(factory) = next.lock().take() {
                    let tail = factory();
                    let target = tail_target.clone();
                    tail.attach_existing(target, None, |_prior, ev: &Event<T, Err>| match ev {
                        Event::Next(v) => Signal::push(v.clone()),
                        Event::Error(e) => Signal::Error(e.clone()),
                        Event::Terminate(r) => Signal::terminate(r.clone()),
                    });
                }
                Signal::Merging
            }
            Event::Terminate(r) => Signal::terminate(r.clone()),
        });

        child
    }

    /// Take the first `n` values from this stream, then continue with
    /// `then()`'s stream from the start.
    pub fn next_then(
        self: &Arc<Self>,
        n: usize,
        then: impl FnOnce() -> Arc<StreamNode<T, Err>> + Send + 'static,
    ) -> Arc<StreamNode<T, Err>> {
        self.first(n).concat(then)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PMutex;

    fn root() -> Arc<StreamNode<i32, String>> {
        StreamNode::new_root("root", Box::new(BaseHooks))
    }

    #[test]
    fn start_prepends_values_ahead_of_the_stream() {
        let input = root();
        let started = input.start(vec![-2, -1]);
        let seen = Arc::new(PMutex::new(Vec::new()));
        let seen2 = seen.clone();
        let _watcher = started.on(move |v| seen2.lock().push(*v));

        input.ingest(Event::Next(0));
        input.ingest(Event::Next(1));

        assert_eq!(*seen.lock(), vec![-2, -1, 0, 1]);
    }

    #[test]
    fn concat_runs_the_second_stream_only_after_completion() {
        let input = root();
        let tail_handle: Arc<PMutex<Option<Arc<StreamNode<i32, String>>>>> = Arc::new(PMutex::new(None));
        let tail_handle2 = tail_handle.clone();
        let chained = input.concat(move || {
            let tail = StreamNode::new_root("tail", Box::new(BaseHooks));
            *tail_handle2.lock() = Some(tail.clone());
            tail
        });
        let seen = Arc::new(PMutex::new(Vec::new()));
        let seen2 = seen.clone();
        let _watcher = chained.on(move |v| seen2.lock().push(*v));

        input.ingest(Event::Next(1));
        assert!(tail_handle.lock().is_none());

        input.ingest(Event::Terminate(TerminationReason::Completed));
        assert_eq!(*seen.lock(), vec![1]);

        let tail = tail_handle.lock().clone().unwrap();
        tail.ingest(Event::Next(99));
        assert_eq!(*seen.lock(), vec![1, 99]);
    }
}
